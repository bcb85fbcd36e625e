use bytes::Bytes;
use futures::stream::Stream;
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use std::pin::Pin;

/// Type alias for streaming body
pub type StreamBody =
	Pin<Box<dyn Stream<Item = Result<Bytes, Box<dyn std::error::Error + Send + Sync>>> + Send>>;

/// Body of a [`Response`].
pub enum Body {
	/// The complete body.
	Full(Bytes),
	/// A body produced incrementally.
	Stream(StreamBody),
}

impl Body {
	/// Returns the bytes of a complete body.
	pub fn as_bytes(&self) -> Option<&Bytes> {
		match self {
			Self::Full(bytes) => Some(bytes),
			Self::Stream(_) => None,
		}
	}

	/// Returns `true` for a streamed body.
	pub fn is_stream(&self) -> bool {
		matches!(self, Self::Stream(_))
	}
}

impl Default for Body {
	fn default() -> Self {
		Self::Full(Bytes::new())
	}
}

impl std::fmt::Debug for Body {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
			Self::Stream(_) => f.write_str("Stream"),
		}
	}
}

/// HTTP Response representation
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Body,
}

/// Streaming HTTP Response
pub struct StreamingResponse<S> {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub stream: S,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use tributary_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.as_bytes().unwrap().is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Body::default(),
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a Response with HTTP 400 Bad Request status
	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	/// Create a Response with HTTP 403 Forbidden status
	pub fn forbidden() -> Self {
		Self::new(StatusCode::FORBIDDEN)
	}

	/// Create a Response with HTTP 404 Not Found status
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a Response with HTTP 500 Internal Server Error status
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Create a Response with HTTP 503 Service Unavailable status
	pub fn service_unavailable() -> Self {
		Self::new(StatusCode::SERVICE_UNAVAILABLE)
	}

	/// Sets a complete body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Body::Full(body.into());
		self
	}

	/// Adds a header; invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(header_name), Ok(header_value)) = (
			hyper::header::HeaderName::from_bytes(name.as_bytes()),
			hyper::header::HeaderValue::from_str(value),
		) {
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Sets an HTML body with the matching content type.
	pub fn with_html(self, html: impl Into<String>) -> Self {
		self.with_header("content-type", "text/html; charset=utf-8")
			.with_body(html.into())
	}

	/// Serializes `data` as the JSON body.
	///
	/// # Errors
	///
	/// Returns [`Error::Json`](crate::Error::Json) when serialization fails.
	pub fn with_json<T: Serialize + ?Sized>(mut self, data: &T) -> crate::Result<Self> {
		let json = serde_json::to_vec(data)?;
		self.body = Body::Full(Bytes::from(json));
		self.headers.insert(
			hyper::header::CONTENT_TYPE,
			hyper::header::HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}
}

impl From<crate::Error> for Response {
	fn from(error: crate::Error) -> Self {
		let body = serde_json::json!({
			"error": error.to_string(),
		});

		Response::new(error.status_code())
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error())
	}
}

impl<S> StreamingResponse<S>
where
	S: Stream<Item = Result<Bytes, Box<dyn std::error::Error + Send + Sync>>> + Send + 'static,
{
	/// Creates a 200 OK streaming response.
	pub fn new(stream: S) -> Self {
		Self {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			stream,
		}
	}

	/// Sets the status.
	pub fn status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	/// Sets a header.
	pub fn header(
		mut self,
		key: hyper::header::HeaderName,
		value: hyper::header::HeaderValue,
	) -> Self {
		self.headers.insert(key, value);
		self
	}

	/// Sets the content type.
	pub fn media_type(self, media_type: &str) -> Self {
		self.header(
			hyper::header::CONTENT_TYPE,
			hyper::header::HeaderValue::from_str(media_type).unwrap_or_else(|_| {
				hyper::header::HeaderValue::from_static("application/octet-stream")
			}),
		)
	}

	/// Converts into a [`Response`] with a streamed body.
	pub fn into_response(self) -> Response {
		Response {
			status: self.status,
			headers: self.headers,
			body: Body::Stream(Box::pin(self.stream)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::StreamExt;
	use rstest::rstest;

	#[rstest]
	fn test_error_response_is_json() {
		let response = Response::from(crate::Error::NotFound("Product not found".into()));

		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert_eq!(
			response.headers.get("content-type").unwrap(),
			"application/json"
		);
		assert_eq!(
			response.body.as_bytes().unwrap().as_ref(),
			br#"{"error":"Product not found"}"#
		);
	}

	#[rstest]
	fn test_with_html() {
		let response = Response::internal_server_error().with_html("<h1>x</h1>");
		assert_eq!(
			response.headers.get("content-type").unwrap(),
			"text/html; charset=utf-8"
		);
		assert!(!response.body.is_stream());
	}

	#[rstest]
	#[tokio::test]
	async fn test_streaming_response_into_response() {
		let chunks = futures::stream::iter(vec![
			Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Bytes::from_static(b"a")),
			Ok(Bytes::from_static(b"b")),
		]);
		let response = StreamingResponse::new(chunks)
			.media_type("text/html; charset=utf-8")
			.into_response();

		assert_eq!(response.status, StatusCode::OK);
		let Body::Stream(mut stream) = response.body else {
			panic!("expected a streamed body");
		};
		let mut collected = Vec::new();
		while let Some(chunk) = stream.next().await {
			collected.extend_from_slice(&chunk.unwrap());
		}
		assert_eq!(collected, b"ab");
	}
}
