//! Request routing for the catalog app.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tributary::conf::Settings;
use tributary::http::{Error, Handler, Request, Response, Result};
use tributary::{PageHandler, StreamErrorPolicy, StreamOptions, StreamingRenderer};

use crate::api;
use crate::components;
use crate::data::ProductSource;

/// Builds render options from settings.
pub fn stream_options(settings: &Settings) -> StreamOptions {
	let policy = if settings.streaming.inline_errors {
		StreamErrorPolicy::InlineError
	} else {
		StreamErrorPolicy::KeepFallback
	};
	let mut options = StreamOptions::new()
		.error_policy(policy)
		.expose_errors(settings.debug);
	if let Some(timeout) = settings.job_timeout() {
		options = options.job_timeout(timeout);
	}
	for script in &settings.streaming.bootstrap_scripts {
		options = options.bootstrap_script(script.clone());
	}
	options
}

/// Dispatches to the product API, static files, or the streamed page.
pub struct CatalogApp {
	source: Arc<dyn ProductSource>,
	static_dir: PathBuf,
	page: Arc<dyn Handler>,
}

impl CatalogApp {
	pub fn new(settings: &Settings, source: Arc<dyn ProductSource>) -> Self {
		let page_source = source.clone();
		let page = PageHandler::new(
			StreamingRenderer::with_options(stream_options(settings)),
			move |request: &Request| {
				let category = request.query_param("category").filter(|c| !c.is_empty());
				Ok(components::app(category, page_source.clone()))
			},
		)
		.channel_capacity(settings.streaming.channel_capacity);

		Self {
			source,
			static_dir: settings.static_dir.clone(),
			page: Arc::new(page),
		}
	}

	/// Serves a file below the static directory.
	///
	/// Returns `None` when no such file exists, so the request falls through
	/// to the page.
	async fn serve_static(&self, path: &str) -> Option<Result<Response>> {
		let relative = path.trim_start_matches('/');
		if relative.is_empty() {
			return None;
		}
		if !is_safe_relative(Path::new(relative)) {
			warn!(path, "rejected static path");
			return Some(Ok(Response::forbidden()));
		}

		let full = self.static_dir.join(relative);
		match tokio::fs::metadata(&full).await {
			Ok(metadata) if metadata.is_file() => {}
			_ => return None,
		}

		let contents = match tokio::fs::read(&full).await {
			Ok(contents) => contents,
			Err(err) => {
				return Some(Err(Error::Internal(format!(
					"failed to read {}: {err}",
					full.display()
				))));
			}
		};
		let mime = mime_guess::from_path(&full).first_or_octet_stream();
		debug!(path, content_type = %mime, "serving static file");

		Some(Ok(Response::ok()
			.with_header("content-type", mime.as_ref())
			.with_body(contents)))
	}
}

#[async_trait]
impl Handler for CatalogApp {
	async fn handle(&self, request: Request) -> Result<Response> {
		if let Some(response) = api::handle(&request, self.source.as_ref()).await {
			return response;
		}
		if request.path().starts_with("/api/") {
			return Err(Error::NotFound("Not found".into()));
		}
		if let Some(response) = self.serve_static(request.path()).await {
			return response;
		}
		self.page.handle(request).await
	}
}

/// Only plain components; no `..`, root or prefix.
fn is_safe_relative(path: &Path) -> bool {
	path.components().all(|c| matches!(c, Component::Normal(_)))
		&& !path.to_string_lossy().contains('\\')
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("client.js", true)]
	#[case("css/site.css", true)]
	#[case("../Cargo.toml", false)]
	#[case("css/../../secret", false)]
	#[case("/etc/passwd", false)]
	#[case("..\\windows", false)]
	fn test_is_safe_relative(#[case] path: &str, #[case] expected: bool) {
		assert_eq!(is_safe_relative(Path::new(path)), expected);
	}

	#[rstest]
	fn test_stream_options_from_settings() {
		let mut settings = Settings::default();
		settings.debug = true;
		settings.streaming.inline_errors = true;
		settings.streaming.job_timeout_ms = Some(500);

		let options = stream_options(&settings);

		assert_eq!(options.error_policy, StreamErrorPolicy::InlineError);
		assert!(options.expose_errors);
		assert_eq!(options.job_timeout, Some(std::time::Duration::from_millis(500)));
		assert_eq!(options.bootstrap_scripts, vec!["/client.js"]);
	}
}
