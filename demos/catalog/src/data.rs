//! Product data source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tributary::RenderError;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub id: u32,
	pub name: String,
	pub price: f64,
	pub description: String,
	pub category: String,
}

impl Product {
	fn new(id: u32, name: &str, price: f64, description: &str, category: &str) -> Self {
		Self {
			id,
			name: name.to_string(),
			price,
			description: description.to_string(),
			category: category.to_string(),
		}
	}
}

/// Filter for [`ProductSource::fetch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
	/// Exact category name. `None` matches every product.
	pub category: Option<String>,
}

impl ProductQuery {
	pub fn category(category: impl Into<String>) -> Self {
		Self {
			category: Some(category.into()),
		}
	}

	fn matches(&self, product: &Product) -> bool {
		self.category
			.as_deref()
			.is_none_or(|category| product.category == category)
	}
}

/// Where product data comes from.
#[async_trait]
pub trait ProductSource: Send + Sync {
	/// Returns the products matching `query`, in catalog order.
	async fn fetch(&self, query: &ProductQuery) -> Result<Vec<Product>, RenderError>;

	/// Looks up a single product.
	async fn find(&self, id: u32) -> Result<Option<Product>, RenderError>;
}

/// Default simulated latency of [`InMemoryCatalog`].
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

/// Products held in memory, answered after a fixed delay.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
	products: Vec<Product>,
	latency: Duration,
}

impl InMemoryCatalog {
	pub fn new(products: Vec<Product>) -> Self {
		Self {
			products,
			latency: DEFAULT_LATENCY,
		}
	}

	/// The five sample products.
	pub fn sample() -> Self {
		Self::new(vec![
			Product::new(
				1,
				"Wireless Headphones",
				99.99,
				"Premium noise-cancelling headphones",
				"Electronics",
			),
			Product::new(
				2,
				"Smart Watch",
				249.99,
				"Fitness tracking and notifications",
				"Electronics",
			),
			Product::new(
				3,
				"Laptop Stand",
				49.99,
				"Ergonomic adjustable stand",
				"Accessories",
			),
			Product::new(
				4,
				"Mechanical Keyboard",
				129.99,
				"RGB backlit mechanical switches",
				"Accessories",
			),
			Product::new(
				5,
				"USB-C Hub",
				79.99,
				"Multi-port adapter for laptops",
				"Accessories",
			),
		])
	}

	/// Sets the delay applied to every [`ProductSource::fetch`].
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = latency;
		self
	}

	pub fn products(&self) -> &[Product] {
		&self.products
	}
}

impl Default for InMemoryCatalog {
	fn default() -> Self {
		Self::sample()
	}
}

#[async_trait]
impl ProductSource for InMemoryCatalog {
	async fn fetch(&self, query: &ProductQuery) -> Result<Vec<Product>, RenderError> {
		if !self.latency.is_zero() {
			tokio::time::sleep(self.latency).await;
		}
		Ok(self
			.products
			.iter()
			.filter(|product| query.matches(product))
			.cloned()
			.collect())
	}

	async fn find(&self, id: u32) -> Result<Option<Product>, RenderError> {
		Ok(self.products.iter().find(|product| product.id == id).cloned())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(ProductQuery::default(), vec![1, 2, 3, 4, 5])]
	#[case(ProductQuery::category("Electronics"), vec![1, 2])]
	#[case(ProductQuery::category("Accessories"), vec![3, 4, 5])]
	#[case(ProductQuery::category("electronics"), vec![])]
	#[case(ProductQuery::category("Garden"), vec![])]
	#[tokio::test(start_paused = true)]
	async fn test_fetch_filters_by_category(#[case] query: ProductQuery, #[case] expected: Vec<u32>) {
		let catalog = InMemoryCatalog::sample();

		let ids: Vec<u32> = catalog
			.fetch(&query)
			.await
			.unwrap()
			.iter()
			.map(|p| p.id)
			.collect();

		assert_eq!(ids, expected);
	}

	#[rstest]
	#[tokio::test(start_paused = true)]
	async fn test_fetch_waits_for_latency() {
		let catalog = InMemoryCatalog::sample().with_latency(Duration::from_millis(100));
		let started = tokio::time::Instant::now();

		catalog.fetch(&ProductQuery::default()).await.unwrap();

		assert!(started.elapsed() >= Duration::from_millis(100));
	}

	#[rstest]
	#[tokio::test]
	async fn test_find() {
		let catalog = InMemoryCatalog::sample();

		assert_eq!(catalog.find(3).await.unwrap().unwrap().name, "Laptop Stand");
		assert!(catalog.find(42).await.unwrap().is_none());
	}
}
