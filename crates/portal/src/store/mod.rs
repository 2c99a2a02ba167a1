//! Storage for the portal.
//!
//! # Stores
//!
//! - [`collection`] - The library's managed holdings, curated by
//!   administrators. In memory, seeded with demo books.
//! - [`credentials`] - In-memory accounts and their secrets. Registered
//!   accounts live only as long as the process.
//! - [`session`] - The single durable slot holding the current session
//!   token, keyed by [`session::SESSION_KEY`].
//!
//! None of the stores has transactional guarantees. Each mutation takes one
//! lock, and the session slot holds a single value.

pub mod collection;
pub mod credentials;
pub mod session;

pub use collection::{BookCollection, BookDraft, BookFilter, BookStatus, CollectionError, ManagedBook};
pub use credentials::{CredentialStore, NewAccount};
pub use session::{FileSessionStore, MemorySessionStore, SESSION_KEY, SessionStore};

use thiserror::Error;

/// Errors returned by the portal stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An account with this email is already registered.
    #[error("an account with this email already exists")]
    DuplicateEmail,

    /// Reading or writing the durable session slot failed.
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored value could not be read as a token string.
    #[error("corrupt session entry: {0}")]
    Corrupt(String),
}
