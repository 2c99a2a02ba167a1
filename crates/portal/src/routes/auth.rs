//! Authentication route handlers.
//!
//! Login and registration are public-only: a signed-in viewer is turned
//! away by the [`PublicOnly`] guard before the handler runs.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use libris_core::Identity;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::PublicOnly;
use crate::middleware::guard::{HOME_PATH, sanitize_return_path};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Login request body.
///
/// No `Debug`: the password must not reach logs.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Location to return to after login.
    pub next: Option<String>,
}

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Location to return to after registration.
    pub next: Option<String>,
}

/// Response to a successful login or registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub identity: Identity,
    /// Where the client should navigate next.
    pub redirect_to: String,
}

impl SessionStarted {
    fn new(identity: Identity, next: Option<&str>) -> Self {
        Self {
            identity,
            redirect_to: next
                .and_then(sanitize_return_path)
                .unwrap_or(HOME_PATH)
                .to_owned(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Log in with email and password.
///
/// # Errors
///
/// Returns 401 with "Invalid email or password" for any credential
/// mismatch, or 409 if a newer session call replaced this one.
pub async fn login(
    State(state): State<AppState>,
    _guard: PublicOnly,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionStarted>> {
    let identity = state
        .access()
        .login(&body.email, &body.password)
        .await?;

    set_sentry_user(&identity.id, Some(identity.email.as_str()));
    Ok(Json(SessionStarted::new(identity, body.next.as_deref())))
}

/// Register a new member account and start its session.
///
/// # Errors
///
/// Returns 409 if the email is already registered, 400 if a field fails
/// validation.
pub async fn register(
    State(state): State<AppState>,
    _guard: PublicOnly,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionStarted>)> {
    let identity = state
        .access()
        .register(&body.email, &body.password, &body.name)
        .await?;

    set_sentry_user(&identity.id, Some(identity.email.as_str()));
    Ok((
        StatusCode::CREATED,
        Json(SessionStarted::new(identity, body.next.as_deref())),
    ))
}

/// End the current session. Succeeds when already signed out.
///
/// # Errors
///
/// Returns 500 if the stored token could not be removed.
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode> {
    state.access().logout()?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
