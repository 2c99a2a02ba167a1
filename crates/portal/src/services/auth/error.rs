//! Authentication error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during login, registration, or a session commit.
///
/// `Display` output is the message shown to the viewer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or wrong secret. The message never says which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("User with this email already exists")]
    DuplicateEmail,

    /// Email address could not be parsed.
    #[error("Please enter a valid email address")]
    InvalidEmail(#[from] libris_core::EmailError),

    /// Password does not meet the registration rules.
    #[error("{0}")]
    WeakPassword(String),

    /// Display name does not meet the registration rules.
    #[error("{0}")]
    InvalidName(String),

    /// A newer session operation started before this one could commit.
    #[error("This request was replaced by a newer one")]
    Superseded,

    /// The durable session slot could not be written.
    #[error("session storage error: {0}")]
    Storage(StoreError),
}

impl AuthError {
    /// Whether the error is the viewer's to fix (as opposed to a server fault).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            other => Self::Storage(other),
        }
    }
}
