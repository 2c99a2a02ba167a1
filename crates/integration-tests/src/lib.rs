//! Integration tests for Libris.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p libris-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_scenarios` - Account and session lifecycle through the access
//!   controller
//! - `portal_router` - The HTTP surface, driven with `tower::ServiceExt`
//!
//! Everything runs in process. The catalog is served by a local axum mock
//! bound to an ephemeral port, so no test touches Open Library.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

use libris_portal::catalog::CatalogClient;
use libris_portal::config::{CatalogConfig, PortalConfig};
use libris_portal::services::{AccessController, AuthService, TokenCodec};
use libris_portal::state::AppState;
use libris_portal::store::{BookCollection, CredentialStore, MemorySessionStore, SessionStore};

/// One portal instance with in-memory storage, the demo accounts and
/// books, and no simulated latency.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemorySessionStore>,
}

impl TestContext {
    /// Build a context with the default catalog endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::build(MemorySessionStore::new(), CatalogConfig::default())
    }

    /// Build a context with `token` already in the session slot.
    #[must_use]
    pub fn with_stored_token(token: &str) -> Self {
        Self::build(MemorySessionStore::with_token(token), CatalogConfig::default())
    }

    /// Build a context whose catalog is served from `base`.
    #[must_use]
    pub fn with_catalog(base: Url) -> Self {
        Self::build(MemorySessionStore::new(), CatalogConfig::with_base(base))
    }

    fn build(store: MemorySessionStore, catalog: CatalogConfig) -> Self {
        let mut config = config();
        config.session.auth_latency = Duration::ZERO;
        config.catalog = catalog;

        let credentials = Arc::new(CredentialStore::with_demo_accounts());
        let codec = TokenCodec::with_ttl(Arc::clone(&credentials), config.session.ttl);
        let auth = AuthService::new(credentials, codec).with_latency(Duration::ZERO);
        let store = Arc::new(store);
        let access = Arc::new(AccessController::new(
            auth,
            Arc::clone(&store) as Arc<dyn SessionStore>,
        ));
        let catalog = CatalogClient::new(&config.catalog);

        Self {
            state: AppState::from_parts(
                config,
                access,
                catalog,
                BookCollection::with_demo_books(),
            ),
            store,
        }
    }

    /// The session handle.
    #[must_use]
    pub fn access(&self) -> &Arc<AccessController> {
        self.state.access()
    }

    /// The portal router for this context.
    #[must_use]
    pub fn app(&self) -> Router {
        libris_portal::app(self.state.clone())
    }

    /// Token currently in the session slot.
    #[must_use]
    pub fn stored_token(&self) -> Option<String> {
        self.store.load().ok().flatten()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with defaults only, ignoring the process environment.
///
/// # Panics
///
/// Panics if the built-in defaults stop parsing.
#[must_use]
pub fn config() -> PortalConfig {
    PortalConfig::from_lookup(|_| None).expect("default configuration")
}

/// Send one request through `app` and decode the JSON body.
///
/// Empty bodies decode as `Value::Null`.
///
/// # Panics
///
/// Panics if the body cannot be read. Non-JSON bodies come back as
/// `Value::String`.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    use tower::ServiceExt;

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

/// `GET uri`.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("valid request")
}

/// `POST uri` with a JSON body.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// `PUT uri` with a JSON body.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn put_json(uri: &str, body: &Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// `DELETE uri`.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
pub fn delete_request(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).expect("valid request")
}

/// Serve a minimal Open Library on an ephemeral port and return its base.
///
/// Knows one work (`OL1W`), one ISBN (`9780441013593`), and answers every
/// search with the same two documents.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn spawn_catalog() -> Url {
    let app = Router::new()
        .route("/search.json", get(mock_search))
        .route("/works/{file}", get(mock_work))
        .route("/api/books", get(mock_books));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock catalog");
    let addr = listener.local_addr().expect("mock catalog address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Url::parse(&format!("http://{addr}")).expect("mock catalog url")
}

async fn mock_search() -> Json<Value> {
    Json(json!({
        "numFound": 2,
        "start": 0,
        "numFoundExact": true,
        "docs": [
            {"key": "/works/OL1W", "title": "Dune", "author_name": ["Frank Herbert"],
             "cover_i": 42, "subject": ["Science fiction", "Deserts", "Politics", "Ecology"],
             "first_publish_year": 1965},
            {"key": "/works/OL2W", "title": "Untitled Notes"}
        ]
    }))
}

async fn mock_work(Path(file): Path<String>) -> (StatusCode, Json<Value>) {
    if file != "OL1W.json" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "notfound"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "title": "Dune",
            "description": {"type": "/type/text", "value": "A desert planet."},
            "subjects": ["Science fiction"],
            "covers": [42],
            "isbn_13": ["9780441013593"],
            "languages": [{"key": "/languages/eng"}]
        })),
    )
}

async fn mock_books(
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    match params.get("bibkeys").map(String::as_str) {
        Some("ISBN:9780441013593") => Json(json!({
            "ISBN:9780441013593": {
                "key": "/books/OL1M",
                "title": "Dune",
                "authors": [{"name": "Frank Herbert"}],
                "publishers": [{"name": "Ace"}],
                "number_of_pages": 604
            }
        })),
        _ => Json(json!({})),
    }
}
