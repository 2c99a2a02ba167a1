//! Authentication service.
//!
//! The login and registration use cases: check credentials against the
//! credential store and mint a session token for the result. Both calls
//! model a latency-bearing boundary with a configurable delay and have no
//! observable side effects until they complete.

mod error;

pub use error::AuthError;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::SecretString;

use libris_core::{Email, Identity, Role, UserId};

use crate::services::token::TokenCodec;
use crate::store::{CredentialStore, NewAccount};

/// Minimum password length for new accounts.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum display name length, after trimming.
const MIN_NAME_LENGTH: usize = 2;

/// Default simulated latency of a login or registration call.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The account the session belongs to.
    pub identity: Identity,
    /// Encoded session token.
    pub token: String,
}

/// Authentication service.
///
/// Owns a handle to the credential store it validates against; there is no
/// process-wide account list.
#[derive(Debug, Clone)]
pub struct AuthService {
    credentials: Arc<CredentialStore>,
    codec: TokenCodec,
    latency: Duration,
}

impl AuthService {
    /// Create a new authentication service with the default latency.
    #[must_use]
    pub const fn new(credentials: Arc<CredentialStore>, codec: TokenCodec) -> Self {
        Self {
            credentials,
            codec,
            latency: DEFAULT_LATENCY,
        }
    }

    /// Set the simulated latency of each call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The credential store this service validates against.
    #[must_use]
    pub const fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// The codec used to mint and resolve tokens.
    #[must_use]
    pub const fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Login with email and secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// secret is wrong, or the email cannot be parsed. The three cases are
    /// indistinguishable to the caller.
    #[tracing::instrument(skip(self, secret))]
    pub async fn login(&self, email: &str, secret: &str) -> Result<IssuedSession, AuthError> {
        tokio::time::sleep(self.latency).await;

        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let identity = self
            .credentials
            .find_by_email_and_secret(&email, secret)
            .ok_or(AuthError::InvalidCredentials)?;

        tracing::info!(user_id = %identity.id, "Login succeeded");
        Ok(self.issue(identity))
    }

    /// Register a new member account and log it in.
    ///
    /// The new account gets a generated ID, the member role, and today's
    /// date as its joined date. The name is stored trimmed.
    ///
    /// # Errors
    ///
    /// Checked in this order, so an existing email is reported even when
    /// the other fields are also invalid:
    ///
    /// - `AuthError::InvalidEmail` if the email cannot be parsed
    /// - `AuthError::DuplicateEmail` if the email is already registered
    /// - `AuthError::InvalidName` if the trimmed name is too short
    /// - `AuthError::WeakPassword` if the secret does not meet the rules
    ///
    /// On any error the credential store is unchanged.
    #[tracing::instrument(skip(self, secret))]
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        name: &str,
    ) -> Result<IssuedSession, AuthError> {
        tokio::time::sleep(self.latency).await;

        let email = Email::parse(email)?;

        if self.credentials.find_by_email(&email).is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let name = validate_name(name)?;
        validate_password(secret)?;

        let identity = Identity {
            id: UserId::generate(),
            email,
            name,
            role: Role::Member,
            joined_date: Some(Utc::now().date_naive()),
        };

        self.credentials.insert(NewAccount {
            identity: identity.clone(),
            secret: SecretString::from(secret.to_owned()),
        })?;

        tracing::info!(user_id = %identity.id, "Account registered");
        Ok(self.issue(identity))
    }

    fn issue(&self, identity: Identity) -> IssuedSession {
        let token = self.codec.encode(&identity);
        IssuedSession { identity, token }
    }
}

/// Validate a display name, returning it trimmed.
fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_lower && has_upper && has_digit) {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_owned(),
        ));
    }

    Ok(())
}
