//! # Tributary Pages
//!
//! Streaming server-side rendering of component trees.
//!
//! A tree is rendered in two phases. The synchronous walk produces the
//! *shell*: everything that can be rendered without waiting, with each
//! suspense boundary contributing its fallback inside a placeholder. Once the
//! shell is committed, the subtrees behind the placeholders are resolved
//! concurrently and delivered as out-of-band patches over the same stream,
//! in whatever order they finish.
//!
//! Errors before the shell replace the whole response with an error
//! document. Errors after it only affect their own placeholder.
//!
//! ## Example
//!
//! ```
//! use tributary_core::{HostElement, IntoNode, Node};
//! use tributary_pages::ssr::StreamingRenderer;
//!
//! # tokio_test_block(async {
//! let tree = HostElement::new("main")
//! 	.child(Node::suspense(
//! 		HostElement::new("span").child("loading"),
//! 		Node::async_component("Count", 3, |n| async move {
//! 			Ok(HostElement::new("span").child(format!("{n} items")).into_node())
//! 		}),
//! 	))
//! 	.into_node();
//!
//! let html = StreamingRenderer::new().render_to_string(tree).await.unwrap();
//! assert_eq!(html, "<main><span>3 items</span></main>");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! # 	tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod handler;
pub mod ssr;

pub use handler::PageHandler;
pub use ssr::{
	RenderController, RenderOutcome, StreamErrorPolicy, StreamOptions, StreamingRenderer,
};
