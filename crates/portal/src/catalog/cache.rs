//! Cache types for Open Library responses.

use super::types::{BookDetail, SearchResponse};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Search {
        query: String,
        limit: u32,
        offset: u32,
    },
    Work(String),
    Isbn(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Search(Box<SearchResponse>),
    Work(Box<BookDetail>),
    // `None` records a confirmed miss so repeated lookups stay local
    Isbn(Option<Box<BookDetail>>),
}
