//! Order catalog client. Lists an order's photos page by page, resolves the
//! order title, and streams photo content from the content host.

pub mod client;
pub mod endpoints;
pub mod error;
mod responses;
pub mod types;

pub use client::{HttpCatalog, OrderCatalog};
pub use endpoints::Endpoints;
pub use error::CatalogError;
pub use types::{CatalogEntry, CatalogPage, ContentTag};
