//! # Tributary
//!
//! Streaming server-side rendering of component trees.
//!
//! A page is described as a tree of [`Node`]s. Rendering it yields a *shell*
//! that can be sent immediately, with every suspense boundary showing its
//! fallback, followed by out-of-band patches that replace those fallbacks as
//! their asynchronous dependencies resolve.
//!
//! This crate re-exports the member crates:
//!
//! - [`core`]: node model and error taxonomy
//! - [`http`]: request, response and handler types
//! - [`pages`]: the streaming renderer and page handler
//! - [`server`]: hyper-based HTTP server (feature `server`)
//! - [`conf`]: settings loaded from TOML and the environment (feature `conf`)
//!
//! ## Feature Flags
//!
//! - `minimal` - Rendering engine and HTTP types only
//! - `full` (default) - Adds `server` and `conf`
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use tributary::prelude::*;
//!
//! fn page(request: &Request) -> tributary::core::Result<Node> {
//! 	let name = request.query_param("name").unwrap_or_default();
//! 	Ok(HostElement::new("main")
//! 		.child(Node::suspense(
//! 			"Loading...",
//! 			Node::async_component("Greeting", name, |name| async move {
//! 				Ok(HostElement::new("p").child(format!("Hello, {name}")).into_node())
//! 			}),
//! 		))
//! 		.into_node())
//! }
//!
//! let handler = PageHandler::new(StreamingRenderer::new(), page);
//! HttpServer::new(Arc::new(handler))
//! 	.listen_with_shutdown(addr, shutdown_signal())
//! 	.await?;
//! ```

pub use tributary_core as core;
pub use tributary_http as http;
pub use tributary_pages as pages;

#[cfg(feature = "server")]
pub use tributary_server as server;

#[cfg(feature = "conf")]
pub use tributary_conf as conf;

pub use tributary_core::{HostElement, IntoNode, Node, RenderError};
pub use tributary_http::{Handler, Request, Response, StreamingResponse};
pub use tributary_pages::{
	PageHandler, RenderController, RenderOutcome, StreamErrorPolicy, StreamOptions,
	StreamingRenderer,
};

#[cfg(feature = "server")]
pub use tributary_server::{HttpServer, shutdown_signal};

#[cfg(feature = "conf")]
pub use tributary_conf::Settings;

/// Commonly used types.
pub mod prelude {
	pub use crate::{
		Handler, HostElement, IntoNode, Node, PageHandler, RenderController, RenderError,
		RenderOutcome, Request, Response, StreamErrorPolicy, StreamOptions, StreamingRenderer,
		StreamingResponse,
	};

	#[cfg(feature = "server")]
	pub use crate::{HttpServer, shutdown_signal};

	#[cfg(feature = "conf")]
	pub use crate::Settings;

	// External
	pub use async_trait::async_trait;
	pub use serde::{Deserialize, Serialize};
	pub use std::sync::Arc;
}
