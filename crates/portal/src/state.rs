//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::config::PortalConfig;
use crate::services::{AccessController, AuthService, TokenCodec};
use crate::store::{BookCollection, CredentialStore, FileSessionStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands every handler the
/// same session handle, catalog client, and managed collection.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    access: Arc<AccessController>,
    catalog: CatalogClient,
    books: BookCollection,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// Seeds the demo accounts and books, and keeps the session slot under
    /// `config.data_dir`. The access controller starts in `Initializing`;
    /// call [`AccessController::initialize`] to restore the session.
    #[must_use]
    pub fn new(config: PortalConfig) -> Self {
        let credentials = Arc::new(CredentialStore::with_demo_accounts());
        let codec = TokenCodec::with_ttl(Arc::clone(&credentials), config.session.ttl);
        let auth = AuthService::new(credentials, codec).with_latency(config.session.auth_latency);
        let store = Arc::new(FileSessionStore::new(&config.data_dir));
        let access = Arc::new(AccessController::new(auth, store));
        let catalog = CatalogClient::new(&config.catalog);

        Self::from_parts(config, access, catalog, BookCollection::with_demo_books())
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(
        config: PortalConfig,
        access: Arc<AccessController>,
        catalog: CatalogClient,
        books: BookCollection,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                access,
                catalog,
                books,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get the session handle.
    #[must_use]
    pub fn access(&self) -> &Arc<AccessController> {
        &self.inner.access
    }

    /// Get the credential store behind the session handle.
    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.inner.access.auth().credentials()
    }

    /// Get a reference to the Open Library client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get the managed book collection.
    #[must_use]
    pub fn books(&self) -> &BookCollection {
        &self.inner.books
    }
}
