//! Error taxonomy for rendering.
//!
//! Every failure that can occur while building or rendering a tree maps onto
//! one [`RenderError`] variant. Whether an error aborts the whole response or
//! only one placeholder is decided by the renderer from the phase in which it
//! is observed, not by the variant itself.

use std::time::Duration;

/// Errors raised while constructing or rendering a node tree.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
	/// The tree is malformed, e.g. an async component outside any suspense boundary.
	#[error("Structural error: {0}")]
	Structural(String),
	/// A component function reported a failure.
	#[error("Component `{component}` failed: {message}")]
	Component {
		/// Name of the failing component.
		component: String,
		/// Human readable failure description.
		message: String,
	},
	/// The asynchronous dependency of a component failed.
	#[error("Dependency failed: {0}")]
	Dependency(String),
	/// A pending job exceeded the configured bound.
	#[error("Pending job timed out after {0:?}")]
	Timeout(Duration),
	/// Writing to the receiving side failed.
	#[error("Transport error: {0}")]
	Transport(String),
	/// Client boundary props could not be serialized.
	#[error("Props serialization failed: {0}")]
	Props(#[from] serde_json::Error),
}

impl RenderError {
	/// Creates a structural error.
	pub fn structural(message: impl Into<String>) -> Self {
		Self::Structural(message.into())
	}

	/// Creates a component error.
	pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Component {
			component: component.into(),
			message: message.into(),
		}
	}

	/// Creates a dependency error from any displayable failure.
	pub fn dependency(error: impl std::fmt::Display) -> Self {
		Self::Dependency(error.to_string())
	}

	/// Short classification used as a structured log field.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Structural(_) => "structural",
			Self::Component { .. } => "component",
			Self::Dependency(_) => "dependency",
			Self::Timeout(_) => "timeout",
			Self::Transport(_) => "transport",
			Self::Props(_) => "props",
		}
	}

	/// Returns `true` when the receiving side is gone and no further output can be delivered.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Result alias used throughout the renderer.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(RenderError::structural("x"), "structural")]
	#[case(RenderError::component("List", "boom"), "component")]
	#[case(RenderError::dependency("db down"), "dependency")]
	#[case(RenderError::Timeout(Duration::from_millis(5)), "timeout")]
	#[case(RenderError::Transport("closed".into()), "transport")]
	fn test_error_kind(#[case] error: RenderError, #[case] kind: &str) {
		assert_eq!(error.kind(), kind);
	}

	#[rstest]
	fn test_error_display() {
		let err = RenderError::component("ProductList", "no rows");
		assert_eq!(err.to_string(), "Component `ProductList` failed: no rows");

		let err = RenderError::Timeout(Duration::from_millis(250));
		assert_eq!(err.to_string(), "Pending job timed out after 250ms");
	}

	#[rstest]
	fn test_only_transport_is_transport() {
		assert!(RenderError::Transport("reset".into()).is_transport());
		assert!(!RenderError::dependency("reset").is_transport());
	}
}
