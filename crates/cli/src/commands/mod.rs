//! CLI command implementations.

pub mod books;
pub mod session;
pub mod token;

use libris_portal::config::{ConfigError, PortalConfig};
use libris_portal::state::AppState;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Login, registration, or logout failed.
    #[error("{0}")]
    Auth(#[from] libris_portal::services::AuthError),

    /// Open Library request failed.
    #[error("{0}")]
    Catalog(#[from] libris_portal::catalog::CatalogError),

    /// Session token could not be read.
    #[error("{0}")]
    Token(#[from] libris_portal::services::TokenError),

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Command-line input was rejected.
    #[error("{0}")]
    Usage(String),
}

/// Build portal state from the environment and restore the durable session.
pub async fn restored_state() -> Result<AppState, CommandError> {
    let config = PortalConfig::from_env()?;
    let state = AppState::new(config);
    state.access().initialize().await;
    Ok(state)
}

/// Log a value as pretty JSON.
pub fn emit(label: &str, value: &impl Serialize) -> Result<(), CommandError> {
    let rendered = serde_json::to_string_pretty(value)?;
    tracing::info!("{label}:\n{rendered}");
    Ok(())
}
