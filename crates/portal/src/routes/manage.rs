//! Managed collection handlers for administrators.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdministrator;
use crate::state::AppState;
use crate::store::{BookDraft, BookFilter, BookStatus, ManagedBook};

/// Filter value that matches everything.
const ALL: &str = "all";

/// Query for `GET /api/admin/books`.
#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    pub q: Option<String>,
    /// Exact genre, or `all`.
    pub genre: Option<String>,
    /// `active`, `inactive`, or `all`.
    pub status: Option<String>,
}

impl ManageQuery {
    fn into_filter(self) -> Result<BookFilter> {
        let status = match self.status.as_deref().filter(|s| *s != ALL) {
            None => None,
            Some("active") => Some(BookStatus::Active),
            Some("inactive") => Some(BookStatus::Inactive),
            Some(other) => {
                return Err(AppError::BadRequest(format!("unknown status: {other}")));
            }
        };

        Ok(BookFilter {
            q: self.q,
            genre: self.genre.filter(|g| g != ALL),
            status,
        })
    }
}

/// List managed books.
///
/// # Errors
///
/// Returns 400 for an unknown status filter.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdministrator,
    Query(query): Query<ManageQuery>,
) -> Result<Json<Vec<ManagedBook>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.books().list(&filter)))
}

/// Add a book to the collection.
///
/// # Errors
///
/// Returns 400 if a required field is blank or the copy count is zero.
pub async fn create(
    State(state): State<AppState>,
    RequireAdministrator(admin): RequireAdministrator,
    Json(draft): Json<BookDraft>,
) -> Result<(StatusCode, Json<ManagedBook>)> {
    let book = state.books().add(draft)?;
    tracing::debug!(admin_id = %admin.id, book_id = %book.id, "Collection changed");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace a book's details.
///
/// # Errors
///
/// Returns 404 for an unknown ID, 400 as for [`create`].
pub async fn update(
    State(state): State<AppState>,
    RequireAdministrator(admin): RequireAdministrator,
    Path(id): Path<String>,
    Json(draft): Json<BookDraft>,
) -> Result<Json<ManagedBook>> {
    let book = state.books().update(&id, draft)?;
    tracing::debug!(admin_id = %admin.id, book_id = %book.id, "Collection changed");
    Ok(Json(book))
}

/// Remove a book from the collection.
///
/// # Errors
///
/// Returns 404 for an unknown ID.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdministrator(admin): RequireAdministrator,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.books().remove(&id)?;
    tracing::debug!(admin_id = %admin.id, book_id = %id, "Collection changed");
    Ok(StatusCode::NO_CONTENT)
}
