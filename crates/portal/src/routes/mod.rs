//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Health check
//!
//! # Session
//! GET  /api/session               - Session snapshot
//! GET  /api/guard?path=&next=     - Route-guard decision for a client route
//! GET  /api/profile               - Signed-in viewer (requires session)
//! GET  /api/admin                 - Account overview (requires administrator)
//!
//! # Managed collection (requires administrator)
//! GET    /api/admin/books?q=&genre=&status= - List managed books
//! POST   /api/admin/books         - Add a book
//! PUT    /api/admin/books/{id}    - Replace a book's details
//! DELETE /api/admin/books/{id}    - Remove a book
//!
//! # Auth
//! POST /api/auth/login            - Login action (public-only)
//! POST /api/auth/register         - Register action (public-only)
//! POST /api/auth/logout           - Logout action
//!
//! # Books
//! GET  /api/books/search          - Catalog search
//! GET  /api/books/trending        - Trending cards
//! GET  /api/books/genre/{genre}   - Cards for a genre
//! GET  /api/books/isbn/{isbn}     - Edition by ISBN
//! GET  /api/books/{work_id}       - Work detail
//! ```

pub mod auth;
pub mod books;
pub mod manage;
pub mod session;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the book routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(books::search))
        .route("/trending", get(books::trending))
        .route("/genre/{genre}", get(books::genre))
        .route("/isbn/{isbn}", get(books::by_isbn))
        .route("/{work_id}", get(books::work))
}

/// Create the managed collection router.
pub fn manage_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(manage::list).post(manage::create))
        .route("/{id}", put(manage::update).delete(manage::remove))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/session", get(session::session))
        .route("/api/guard", get(session::guard))
        .route("/api/profile", get(session::profile))
        .route("/api/admin", get(session::admin))
        .nest("/api/auth", auth_routes())
        .nest("/api/books", book_routes())
        .nest("/api/admin/books", manage_routes())
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}
