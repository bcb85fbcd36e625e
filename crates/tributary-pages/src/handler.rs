//! Request entry point for streamed pages.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;
use tributary_core::Node;
use tributary_http::{Handler, Request, Response, StreamingResponse};

use crate::ssr::{RenderController, RenderOutcome, StreamingRenderer};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default number of chunks buffered between the render task and the body.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Renders a page per request and streams it.
///
/// `build` constructs the root node for a request. It runs before the shell
/// decision, so its errors produce the error document like any other shell
/// error. Query parameters are available to it untouched through the request.
pub struct PageHandler<F> {
	build: F,
	renderer: Arc<StreamingRenderer>,
	channel_capacity: usize,
}

impl<F> PageHandler<F>
where
	F: Fn(&Request) -> tributary_core::Result<Node> + Send + Sync + 'static,
{
	/// Creates a handler rendering with `renderer`.
	pub fn new(renderer: StreamingRenderer, build: F) -> Self {
		Self {
			build,
			renderer: Arc::new(renderer),
			channel_capacity: DEFAULT_CHANNEL_CAPACITY,
		}
	}

	/// Sets how many chunks may be buffered ahead of the client.
	pub fn channel_capacity(mut self, capacity: usize) -> Self {
		self.channel_capacity = capacity;
		self
	}
}

#[async_trait]
impl<F> Handler for PageHandler<F>
where
	F: Fn(&Request) -> tributary_core::Result<Node> + Send + Sync + 'static,
{
	async fn handle(&self, request: Request) -> tributary_http::Result<Response> {
		let controller = RenderController::new();
		let outcome = match (self.build)(&request) {
			Ok(root) => self.renderer.render(root, controller),
			Err(error) => self.renderer.fail(error, &controller),
		};

		let response = match outcome {
			RenderOutcome::Shell(stream) => {
				debug!(path = request.path(), "streaming page");
				let body = stream
					.into_body(self.channel_capacity)
					.map(Ok::<_, BoxError>);
				StreamingResponse::new(body)
					.media_type("text/html; charset=utf-8")
					.into_response()
			}
			RenderOutcome::Failed(failure) => {
				Response::internal_server_error().with_html(failure.document)
			}
			RenderOutcome::Cancelled => Response::service_unavailable(),
		};
		Ok(response)
	}
}
