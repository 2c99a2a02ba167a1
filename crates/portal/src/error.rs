//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::services::auth::AuthError;
use crate::store::CollectionError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login, registration, or session commit failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Open Library request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Managed collection rejected a change.
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::DuplicateEmail | AuthError::Superseded => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidName(_) => StatusCode::BAD_REQUEST,
                AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                CatalogError::Http(_) | CatalogError::Status(_) | CatalogError::Parse(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Self::Collection(err) => match err {
                CollectionError::Invalid(_) => StatusCode::BAD_REQUEST,
                CollectionError::NotFound(_) => StatusCode::NOT_FOUND,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Auth(AuthError::Storage(_))
                | Self::Catalog(
                    CatalogError::Http(_) | CatalogError::Status(_) | CatalogError::Parse(_)
                )
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Viewer-facing messages pass through; storage failures and internal
        // errors are hidden
        let message = match &self {
            Self::Internal(_) | Self::Auth(AuthError::Storage(_)) => {
                "Internal server error".to_string()
            }
            Self::Auth(err) => err.to_string(),
            Self::Catalog(err) => err.to_string(),
            Self::Collection(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("OL1W".to_string());
        assert_eq!(err.to_string(), "Not found: OL1W");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::DuplicateEmail.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::WeakPassword("short".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::Superseded.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::Storage(StoreError::Corrupt("x".to_string())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_catalog_status_codes() {
        assert_eq!(
            get_status(CatalogError::NotFound("OL1W".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CatalogError::Status(503).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(CatalogError::InvalidInput("isbn".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_collection_errors_reach_the_viewer() {
        let err = CollectionError::Invalid("Total copies must be at least 1".to_string());
        assert_eq!(err.to_string(), "Total copies must be at least 1");
        assert_eq!(get_status(err.into()), StatusCode::BAD_REQUEST);

        assert_eq!(
            get_status(CollectionError::NotFound("book_1".to_string()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_other_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
