//! Book catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::catalog::types::{BookCard, BookDetail, SearchResponse};
use crate::catalog::{CatalogClient, DEFAULT_LIMIT};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Largest page a client may ask for.
const MAX_LIMIT: u32 = 100;

/// Which field a search is restricted to.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    Any,
    Title,
    Author,
    Subject,
}

/// Query for `GET /api/books/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub by: SearchField,
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

/// Query for the card listings.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

fn page_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn cards(catalog: &CatalogClient, response: &SearchResponse) -> Vec<BookCard> {
    response.docs.iter().map(|doc| catalog.book_card(doc)).collect()
}

/// Search the catalog.
///
/// # Errors
///
/// Returns 400 for an empty query, 502 if Open Library fails.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let terms = query.q.trim();
    if terms.is_empty() {
        return Err(AppError::BadRequest("q must not be empty".to_string()));
    }

    let catalog = state.catalog();
    let limit = page_limit(query.limit);
    let response = match query.by {
        SearchField::Any => catalog.search(terms, limit, query.offset).await?,
        SearchField::Title => catalog.search_by_title(terms, limit).await?,
        SearchField::Author => catalog.search_by_author(terms, limit).await?,
        SearchField::Subject => catalog.search_by_subject(terms, limit).await?,
    };

    Ok(Json(response))
}

/// Popular fiction and bestsellers, as display cards.
///
/// # Errors
///
/// Returns 502 if Open Library fails.
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BookCard>>> {
    let catalog = state.catalog();
    let response = catalog.trending(page_limit(query.limit)).await?;
    Ok(Json(cards(catalog, &response)))
}

/// Books in a genre, as display cards.
///
/// # Errors
///
/// Returns 502 if Open Library fails.
pub async fn genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BookCard>>> {
    let catalog = state.catalog();
    let response = catalog.by_genre(&genre, page_limit(query.limit)).await?;
    Ok(Json(cards(catalog, &response)))
}

/// Edition lookup by ISBN.
///
/// # Errors
///
/// Returns 400 for a malformed ISBN, 404 if Open Library has no record.
pub async fn by_isbn(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookDetail>> {
    state
        .catalog()
        .by_isbn(&isbn)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("ISBN {isbn}")))
}

/// Extended metadata for a work.
///
/// # Errors
///
/// Returns 400 for a malformed work id, 404 if the work does not exist.
pub async fn work(
    State(state): State<AppState>,
    Path(work_id): Path<String>,
) -> Result<Json<BookDetail>> {
    Ok(Json(state.catalog().work_details(&work_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(page_limit(None), DEFAULT_LIMIT);
        assert_eq!(page_limit(Some(0)), 1);
        assert_eq!(page_limit(Some(5)), 5);
        assert_eq!(page_limit(Some(10_000)), MAX_LIMIT);
    }
}
