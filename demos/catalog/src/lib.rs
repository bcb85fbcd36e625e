//! Product catalog demo.
//!
//! The page shell (layout, category filter) is sent immediately; the
//! product list is fetched behind a suspense boundary and streamed in as a
//! patch once the data source answers.

pub mod api;
pub mod components;
pub mod data;
pub mod routes;

pub use data::{InMemoryCatalog, Product, ProductQuery, ProductSource};
pub use routes::CatalogApp;
