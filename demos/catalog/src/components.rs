//! Page components.
//!
//! ```text
//! App
//! └── Layout
//!     └── ProductCatalog
//!         ├── CategoryFilter   (client boundary)
//!         └── Suspense("Loading products...")
//!             └── ProductList  (async, reads the data source)
//! ```

use serde::Serialize;
use std::sync::Arc;
use tributary::{HostElement, IntoNode, Node};

use crate::data::{Product, ProductQuery, ProductSource};

/// Categories offered by the filter, in display order.
pub const CATEGORIES: [&str; 3] = ["All", "Electronics", "Accessories"];

/// Fallback shown while the product list is pending.
pub const LOADING_TEXT: &str = "Loading products...";

/// Shown when a category has no products.
pub const EMPTY_TEXT: &str = "No products found in this category.";

const STYLES: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
	font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
	background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
	min-height: 100vh;
	padding: 20px;
}
.container {
	max-width: 1200px;
	margin: 0 auto;
	background: white;
	border-radius: 12px;
	box-shadow: 0 20px 60px rgba(0, 0, 0, 0.3);
	overflow: hidden;
}
header {
	background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
	color: white;
	padding: 30px;
	text-align: center;
}
h1 { font-size: 2.5rem; margin-bottom: 10px; }
.subtitle { opacity: 0.9; font-size: 1.1rem; }
main { padding: 30px; }
.loading { text-align: center; padding: 40px; color: #666; }
.tb-error { background: #fee; color: #c33; padding: 20px; border-radius: 8px; margin: 20px 0; }
.filters { display: flex; gap: 10px; margin-bottom: 20px; flex-wrap: wrap; }
.filter {
	padding: 10px 20px;
	border: none;
	border-radius: 6px;
	background: #f0f0f0;
	color: #666;
	cursor: pointer;
	font-size: 0.95rem;
}
.filter.active {
	background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
	color: white;
	font-weight: 600;
}
.grid {
	display: grid;
	grid-template-columns: repeat(auto-fill, minmax(280px, 1fr));
	gap: 20px;
	margin-top: 20px;
}
.card { border: 1px solid #e0e0e0; border-radius: 8px; padding: 20px; background: white; }
.card-badge {
	background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
	height: 200px;
	border-radius: 6px;
	margin-bottom: 15px;
	display: flex;
	align-items: center;
	justify-content: center;
	color: white;
	font-size: 3rem;
}
.card h3 { margin-bottom: 8px; color: #333; }
.card p { color: #666; font-size: 0.9rem; margin-bottom: 12px; line-height: 1.5; }
.card-footer { display: flex; justify-content: space-between; align-items: center; margin-top: 15px; }
.tag { background: #f0f0f0; padding: 4px 12px; border-radius: 12px; font-size: 0.85rem; color: #666; }
.price { font-size: 1.5rem; font-weight: bold; color: #667eea; }
"#;

/// Props of the `CategoryFilter` client component, as sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilterProps {
	pub current_category: Option<String>,
}

/// The whole document for one request.
///
/// `category` is the raw `category` query parameter, forwarded to the data
/// source untouched.
pub fn app(category: Option<String>, source: Arc<dyn ProductSource>) -> Node {
	Node::component("App", (category, source), |(category, source)| {
		Ok(HostElement::new("html")
			.attr("lang", "en")
			.child(
				HostElement::new("head")
					.child(HostElement::new("meta").attr("charset", "utf-8"))
					.child(
						HostElement::new("meta")
							.attr("name", "viewport")
							.attr("content", "width=device-width, initial-scale=1"),
					)
					.child(HostElement::new("title").child("Product Catalog - Tributary Streaming Demo")),
			)
			.child(
				HostElement::new("body").child(
					HostElement::new("div")
						.attr("id", "root")
						.child(layout(product_catalog(category, source))),
				),
			)
			.into_node())
	})
}

/// Page chrome: inline styles, header, and a `main` holding `children`.
pub fn layout(children: impl IntoNode) -> Node {
	HostElement::new("div")
		.child(HostElement::new("style").child(STYLES))
		.child(
			HostElement::new("div")
				.attr("class", "container")
				.child(
					HostElement::new("header")
						.child(HostElement::new("h1").child("Product Catalog"))
						.child(
							HostElement::new("p")
								.attr("class", "subtitle")
								.child("Streamed with suspense boundaries"),
						),
				)
				.child(HostElement::new("main").child(children)),
		)
		.into_node()
}

/// Filter island plus the product list behind a suspense boundary.
pub fn product_catalog(category: Option<String>, source: Arc<dyn ProductSource>) -> Node {
	Node::component("ProductCatalog", (category, source), |(category, source)| {
		let filter = category_filter(CategoryFilterProps {
			current_category: category.clone(),
		})?;
		Ok(HostElement::new("div")
			.child(filter)
			.child(Node::suspense(
				HostElement::new("div").attr("class", "loading").child(LOADING_TEXT),
				product_list(category, source),
			))
			.into_node())
	})
}

/// Server markup of the category filter, wrapped in a client boundary.
///
/// # Errors
///
/// Fails when the props cannot be serialized.
pub fn category_filter(props: CategoryFilterProps) -> tributary::core::Result<Node> {
	let buttons = CATEGORIES.iter().map(|&category| {
		let active = match props.current_category.as_deref() {
			None => category == "All",
			Some(current) => category == current,
		};
		HostElement::new("button")
			.attr("type", "button")
			.attr("class", if active { "filter active" } else { "filter" })
			.attr("data-category", category)
			.child(category)
	});
	let markup = HostElement::new("div").attr("class", "filters").children(buttons);
	Node::client("CategoryFilter", &props, markup)
}

/// Fetches the products for `category` and renders them.
pub fn product_list(category: Option<String>, source: Arc<dyn ProductSource>) -> Node {
	Node::async_component("ProductList", (category, source), |(category, source)| async move {
		let products = source.fetch(&ProductQuery { category }).await?;
		Ok(product_grid(&products))
	})
}

/// Grid of product cards, or the empty-category message.
pub fn product_grid(products: &[Product]) -> Node {
	if products.is_empty() {
		return HostElement::new("div")
			.attr("class", "loading")
			.child(HostElement::new("p").child(EMPTY_TEXT))
			.into_node();
	}
	HostElement::new("div")
		.attr("class", "grid")
		.children(products.iter().map(product_card))
		.into_node()
}

fn product_card(product: &Product) -> Node {
	let initial = product.name.chars().next().map(String::from).unwrap_or_default();
	HostElement::new("div")
		.attr("class", "card")
		.attr("data-product-id", product.id.to_string())
		.child(HostElement::new("div").attr("class", "card-badge").child(initial))
		.child(HostElement::new("h3").child(product.name.clone()))
		.child(HostElement::new("p").child(product.description.clone()))
		.child(
			HostElement::new("div")
				.attr("class", "card-footer")
				.child(HostElement::new("span").attr("class", "tag").child(product.category.clone()))
				.child(
					HostElement::new("span")
						.attr("class", "price")
						.child(format!("${}", product.price)),
				),
		)
		.into_node()
}
