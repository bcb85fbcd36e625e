//! Handler trait for HTTP request processing.
//!
//! ```rust
//! use tributary_http::{Handler, Request, Response};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//! 	async fn handle(&self, _request: Request) -> tributary_http::Result<Response> {
//! 		Ok(Response::ok().with_body("Hello!"))
//! 	}
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Handler trait for processing requests.
///
/// This is the core abstraction - all request handlers implement this trait.
/// Handlers receive a request and produce a response or an error.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed.
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation for `Arc<T>` where T: Handler.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	struct Echo;

	#[async_trait]
	impl Handler for Echo {
		async fn handle(&self, request: Request) -> Result<Response> {
			Ok(Response::ok().with_body(request.path().to_string()))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_arc_dyn_handler() {
		let handler: Arc<dyn Handler> = Arc::new(Echo);
		let request = Request::builder().uri("/echo").build().unwrap();

		let response = handler.handle(request).await.unwrap();
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body.as_bytes().unwrap().as_ref(), b"/echo");
	}
}
