use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tributary::conf::Settings;
use tributary::server::{HttpServer, shutdown_signal};
use tributary_catalog::{CatalogApp, InMemoryCatalog};

const DEFAULT_CONFIG: &str = "catalog.toml";

#[tokio::main]
async fn main() -> Result<()> {
	let config = std::env::args()
		.nth(1)
		.map(PathBuf::from)
		.or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|path| path.is_file()));
	let settings = Settings::load(config.as_deref()).context("failed to load settings")?;

	init_logging(&settings.log_filter);
	if let Some(path) = &config {
		info!(path = %path.display(), "loaded settings");
	}

	let source = Arc::new(InMemoryCatalog::sample());
	let app = CatalogApp::new(&settings, source);
	let addr = settings.bind_addr()?;

	info!(%addr, static_dir = %settings.static_dir.display(), "starting product catalog");
	HttpServer::new(Arc::new(app))
		.listen_with_shutdown(addr, shutdown_signal())
		.await
		.map_err(|err| anyhow::anyhow!(err))?;

	info!("server stopped");
	Ok(())
}

fn init_logging(filter: &str) {
	let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.init();
}
