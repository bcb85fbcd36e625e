//! HTTP request representation.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::Result;

/// HTTP Request representation
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	/// Creates a request from its parts.
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
		}
	}

	/// Starts building a request.
	///
	/// # Examples
	///
	/// ```
	/// use tributary_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	/// 	.method(Method::GET)
	/// 	.uri("/api/products?category=Electronics")
	/// 	.build()
	/// 	.unwrap();
	///
	/// assert_eq!(request.path(), "/api/products");
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Raw query string, without the leading `?`.
	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// URL-decoded query parameters. Later duplicates win.
	///
	/// A query string that fails to decode is logged and yields an empty map;
	/// use [`Request::query`] to surface the error instead.
	pub fn query_params(&self) -> HashMap<String, String> {
		let Some(query) = self.query_string() else {
			return HashMap::new();
		};
		match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
			Ok(pairs) => pairs.into_iter().collect(),
			Err(err) => {
				debug!(query, error = %err, "malformed query string");
				HashMap::new()
			}
		}
	}

	/// A single decoded query parameter.
	pub fn query_param(&self, name: &str) -> Option<String> {
		self.query_params().remove(name)
	}

	/// Deserializes the query string into `T`.
	///
	/// # Errors
	///
	/// Returns [`Error::Query`](crate::Error::Query) when the query string
	/// does not match `T`.
	pub fn query<T: DeserializeOwned>(&self) -> Result<T> {
		Ok(serde_urlencoded::from_str(self.query_string().unwrap_or(""))?)
	}
}

/// Builder for [`Request`], mostly used in tests.
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	headers: HeaderMap,
	body: Bytes,
}

impl RequestBuilder {
	/// Sets the method.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	/// Sets the URI.
	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Adds a header; invalid names or values are ignored.
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			hyper::header::HeaderName::from_bytes(name.as_bytes()),
			hyper::header::HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Sets the body.
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Builds the request.
	///
	/// # Errors
	///
	/// Returns [`Error::Internal`](crate::Error::Internal) when the URI is
	/// invalid.
	pub fn build(self) -> Result<Request> {
		let uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse::<Uri>()
			.map_err(|e| crate::Error::Internal(format!("invalid URI: {e}")))?;
		Ok(Request::new(
			self.method,
			uri,
			Version::HTTP_11,
			self.headers,
			self.body,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::Deserialize;

	#[derive(Debug, Deserialize, PartialEq)]
	struct CatalogQuery {
		category: Option<String>,
	}

	#[rstest]
	fn test_query_params_are_decoded() {
		let request = Request::builder()
			.uri("/?category=Home%20Office&page=2")
			.build()
			.unwrap();
		let params = request.query_params();

		assert_eq!(params.get("category").map(String::as_str), Some("Home Office"));
		assert_eq!(params.get("page").map(String::as_str), Some("2"));
	}

	#[rstest]
	#[case("/", None)]
	#[case("/?category=Electronics", Some("Electronics"))]
	fn test_typed_query(#[case] uri: &str, #[case] expected: Option<&str>) {
		let request = Request::builder().uri(uri).build().unwrap();
		let query: CatalogQuery = request.query().unwrap();
		assert_eq!(query.category.as_deref(), expected);
	}

	#[derive(Debug, Deserialize)]
	struct PageQuery {
		#[allow(dead_code)]
		page: Option<u32>,
	}

	#[rstest]
	fn test_lenient_params_keep_undecodable_pairs() {
		let request = Request::builder()
			.uri("/?category=Home%ZZ&flag&page=abc")
			.build()
			.unwrap();
		let params = request.query_params();

		assert_eq!(params.get("category").map(String::as_str), Some("Home%ZZ"));
		assert_eq!(params.get("flag").map(String::as_str), Some(""));
		assert_eq!(params.get("page").map(String::as_str), Some("abc"));
	}

	#[rstest]
	fn test_typed_query_rejects_mismatched_value() {
		let request = Request::builder().uri("/?page=abc").build().unwrap();
		let result = request.query::<PageQuery>();

		assert!(matches!(result, Err(crate::Error::Query(_))));
		assert_eq!(
			crate::Response::from(result.unwrap_err()).status,
			hyper::StatusCode::BAD_REQUEST
		);
	}

	#[rstest]
	fn test_builder_defaults() {
		let request = Request::builder().build().unwrap();
		assert_eq!(request.method, Method::GET);
		assert_eq!(request.path(), "/");
		assert!(request.query_string().is_none());
	}

	#[rstest]
	fn test_invalid_uri_is_rejected() {
		assert!(Request::builder().uri("http://[bad").build().is_err());
	}
}
