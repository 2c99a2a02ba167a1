//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! libris login -e user@library.com -p user123
//! libris whoami
//! libris guard /admin
//! libris logout
//! ```
//!
//! The session token is kept under `LIBRIS_DATA_DIR`, so a login survives
//! into later invocations. Registered accounts live in memory only and do
//! not.

use libris_portal::middleware::{evaluate_path, route_access_for};

use super::{CommandError, emit, restored_state};

/// Log in and persist the session.
pub async fn login(email: &str, password: &str) -> Result<(), CommandError> {
    let state = restored_state().await?;
    let identity = state.access().login(email, password).await?;

    tracing::info!("Logged in as {} <{}> ({})", identity.name, identity.email, identity.role);
    Ok(())
}

/// Register a member account and persist its session.
pub async fn register(email: &str, password: &str, name: &str) -> Result<(), CommandError> {
    let state = restored_state().await?;
    let identity = state.access().register(email, password, name).await?;

    tracing::info!("Registered {} <{}> as {}", identity.name, identity.email, identity.id);
    Ok(())
}

/// End the persisted session.
pub async fn logout() -> Result<(), CommandError> {
    let state = restored_state().await?;
    let was_signed_in = state.access().snapshot().is_authenticated();
    state.access().logout()?;

    if was_signed_in {
        tracing::info!("Logged out");
    } else {
        tracing::info!("No active session");
    }
    Ok(())
}

/// Show the current session.
pub async fn whoami() -> Result<(), CommandError> {
    let state = restored_state().await?;
    emit("Session", &state.access().snapshot().view())
}

/// Show the route-guard decision for a client path.
pub async fn guard(path: &str, next: Option<&str>) -> Result<(), CommandError> {
    if !path.starts_with('/') {
        return Err(CommandError::Usage(format!("path must start with '/': {path}")));
    }

    let state = restored_state().await?;
    let session = state.access().snapshot();
    let decision = evaluate_path(&session, path, next);

    tracing::info!(access = ?route_access_for(path), "Route {path}");
    match decision.location() {
        Some(location) => tracing::info!(?decision, "Redirect to {location}"),
        None => tracing::info!(?decision, "No redirect"),
    }
    Ok(())
}
