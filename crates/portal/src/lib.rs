//! Libris portal library.
//!
//! Session access control, route guarding, and the Open Library catalog
//! client, exposed as a library so the binary, the CLI, and the
//! integration tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the portal router with its state attached.
///
/// Sentry layers are added by the binary; tests drive this router directly.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
