//! JSON product API.

use tributary::http::{Error, Request, Response, Result};

use crate::data::{ProductQuery, ProductSource};

/// Path prefix served by [`handle`].
pub const API_PREFIX: &str = "/api/products";

/// Answers `GET /api/products[?category=X]` and `GET /api/products/{id}`.
///
/// Returns `None` for paths outside the product API.
pub async fn handle(request: &Request, source: &dyn ProductSource) -> Option<Result<Response>> {
	let rest = request.path().strip_prefix(API_PREFIX)?;
	match rest.trim_end_matches('/') {
		"" => Some(list_products(request, source).await),
		detail => {
			let id = detail.strip_prefix('/')?;
			Some(product_detail(id, source).await)
		}
	}
}

/// Lists products, filtered by the `category` query parameter when present.
///
/// # Errors
///
/// Propagates data source failures.
pub async fn list_products(request: &Request, source: &dyn ProductSource) -> Result<Response> {
	let query = ProductQuery {
		category: request.query_param("category").filter(|c| !c.is_empty()),
	};
	let products = source.fetch(&query).await?;
	Response::ok().with_json(&products)
}

/// Returns one product by id.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when `id` is not a known product id.
pub async fn product_detail(id: &str, source: &dyn ProductSource) -> Result<Response> {
	let product = match id.parse::<u32>() {
		Ok(id) => source.find(id).await?,
		Err(_) => None,
	};
	match product {
		Some(product) => Response::ok().with_json(&product),
		None => Err(Error::NotFound("Product not found".into())),
	}
}
