//! # Tributary Core
//!
//! Core types shared by every Tributary crate.
//!
//! - [`node`]: the closed set of node kinds a render tree is built from
//! - [`exception`]: the error taxonomy used across shell and stream rendering
//!
//! ## Example
//!
//! ```
//! use tributary_core::node::{HostElement, IntoNode, Node};
//!
//! let tree = HostElement::new("div")
//! 	.attr("class", "container")
//! 	.child(HostElement::new("p").child("static"))
//! 	.into_node();
//!
//! assert!(matches!(tree, Node::Host(_)));
//! ```

pub mod exception;
pub mod node;

pub use exception::{RenderError, Result};
pub use node::{
	AsyncComponent, ClientBoundary, ClientReference, HostElement, IntoNode, Node, NodeFuture,
	SuspenseBoundary, SyncComponent,
};
