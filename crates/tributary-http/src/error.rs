//! Errors returned by handlers.

use hyper::StatusCode;
use tributary_core::RenderError;

/// Errors a [`Handler`](crate::Handler) may return.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Rendering failed before a response could be produced.
	#[error(transparent)]
	Render(#[from] RenderError),
	/// JSON serialization failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	/// The query string could not be decoded.
	#[error("Invalid query string: {0}")]
	Query(#[from] serde_urlencoded::de::Error),
	/// The requested resource does not exist.
	#[error("{0}")]
	NotFound(String),
	/// Any other server-side failure.
	#[error("Internal server error: {0}")]
	Internal(String),
}

impl Error {
	/// HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Query(_) => StatusCode::BAD_REQUEST,
			Self::NotFound(_) => StatusCode::NOT_FOUND,
			Self::Render(_) | Self::Json(_) | Self::Internal(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

/// Result alias for handlers.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::NotFound("Product not found".into()), StatusCode::NOT_FOUND)]
	#[case(Error::Internal("db".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	#[case(Error::Render(RenderError::structural("x")), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_status_code(#[case] error: Error, #[case] status: StatusCode) {
		assert_eq!(error.status_code(), status);
	}

	#[rstest]
	fn test_not_found_message_is_verbatim() {
		assert_eq!(Error::NotFound("Product not found".into()).to_string(), "Product not found");
	}
}
