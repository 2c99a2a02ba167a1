//! Open Library catalog client.
//!
//! # Architecture
//!
//! - Read-only JSON APIs over `reqwest`, no authentication
//! - In-memory caching via `moka` for API responses (5 minute TTL)
//! - Failures are surfaced to the caller unchanged; nothing is retried
//!
//! # APIs
//!
//! - `search.json` - free-text search with paging
//! - `works/{id}.json` - extended metadata for one work
//! - `api/books?jscmd=data` - edition lookup by ISBN
//! - covers - image URLs keyed by cover ID and size class
//!
//! # Example
//!
//! ```rust,ignore
//! use libris_portal::catalog::{CatalogClient, DEFAULT_LIMIT};
//!
//! let client = CatalogClient::new(&config.catalog);
//! let page = client.search("dune", DEFAULT_LIMIT, 0).await?;
//! let cards: Vec<_> = page.docs.iter().map(|b| client.book_card(b)).collect();
//! ```

mod cache;
mod client;
pub mod types;

pub use client::{CatalogClient, DEFAULT_LIMIT, TRENDING_QUERY};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to Open Library.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Open Library answered with a non-success status.
    #[error("Open Library returned status {0}")]
    Status(u16),

    /// The requested work does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A key or ISBN supplied by the caller is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
