//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `LIBRIS_HOST` - Bind address (default: 127.0.0.1)
//! - `LIBRIS_PORT` - Listen port (default: 3000)
//! - `LIBRIS_DATA_DIR` - Directory holding the session slot (default: the
//!   platform data directory, falling back to `./libris-data`)
//! - `LIBRIS_SESSION_TTL_HOURS` - Session token lifetime (default: 24)
//! - `LIBRIS_AUTH_LATENCY_MS` - Simulated login/register latency (default: 1000)
//! - `OPEN_LIBRARY_BASE_URL` - Catalog API base (default: <https://openlibrary.org>)
//! - `OPEN_LIBRARY_COVERS_URL` - Cover image base (default: <https://covers.openlibrary.org/b>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;
use url::Url;

use crate::services::token::DEFAULT_TTL_HOURS;

const DEFAULT_OPEN_LIBRARY_URL: &str = "https://openlibrary.org";
const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org/b";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the durable session slot
    pub data_dir: PathBuf,
    /// Session issuing settings
    pub session: SessionConfig,
    /// Open Library endpoints
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Session issuing settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Lifetime of issued tokens
    pub ttl: TimeDelta,
    /// Simulated latency of login and registration
    pub auth_latency: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::hours(DEFAULT_TTL_HOURS),
            auth_latency: crate::services::auth::DEFAULT_LATENCY,
        }
    }
}

/// Open Library endpoints.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// API base, e.g. `https://openlibrary.org`
    pub base_url: Url,
    /// Cover image base, e.g. `https://covers.openlibrary.org/b`
    pub covers_url: Url,
}

impl CatalogConfig {
    /// Point both endpoints at `base` (used against a local mock server).
    #[must_use]
    pub fn with_base(base: Url) -> Self {
        Self {
            covers_url: base.clone(),
            base_url: base,
        }
    }
}

impl Default for CatalogConfig {
    // Both constants are valid URLs
    #[allow(clippy::unwrap_used)]
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_OPEN_LIBRARY_URL).unwrap(),
            covers_url: Url::parse(DEFAULT_COVERS_URL).unwrap(),
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.parse_or("LIBRIS_HOST", "127.0.0.1")?;
        let port = env.parse_or("LIBRIS_PORT", "3000")?;
        let data_dir = env
            .get("LIBRIS_DATA_DIR")
            .map_or_else(default_data_dir, PathBuf::from);

        let ttl_hours: i64 = env.parse_or("LIBRIS_SESSION_TTL_HOURS", "24")?;
        if ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "LIBRIS_SESSION_TTL_HOURS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let ttl = TimeDelta::try_hours(ttl_hours).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "LIBRIS_SESSION_TTL_HOURS".to_string(),
                "out of range".to_string(),
            )
        })?;
        let latency_ms: u64 = env.parse_or("LIBRIS_AUTH_LATENCY_MS", "1000")?;

        let catalog = CatalogConfig {
            base_url: env.url_or("OPEN_LIBRARY_BASE_URL", DEFAULT_OPEN_LIBRARY_URL)?,
            covers_url: env.url_or("OPEN_LIBRARY_COVERS_URL", DEFAULT_COVERS_URL)?,
        };

        Ok(Self {
            host,
            port,
            data_dir,
            session: SessionConfig {
                ttl,
                auth_latency: Duration::from_millis(latency_ms),
            },
            catalog,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get the default data directory.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "libris", "libris")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./libris-data"))
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a variable, treating empty values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable with a default value.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .as_deref()
            .unwrap_or(default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse an absolute http(s) URL with a default value.
    fn url_or(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let url: Url = self.parse_or(key, default)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PortalConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        PortalConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.session.ttl, TimeDelta::hours(24));
        assert_eq!(config.session.auth_latency, Duration::from_millis(1000));
        assert_eq!(config.catalog.base_url.as_str(), "https://openlibrary.org/");
        assert_eq!(
            config.catalog.covers_url.as_str(),
            "https://covers.openlibrary.org/b"
        );
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("LIBRIS_HOST", "0.0.0.0"),
            ("LIBRIS_PORT", "8080"),
            ("LIBRIS_DATA_DIR", "/tmp/libris"),
            ("LIBRIS_SESSION_TTL_HOURS", "2"),
            ("LIBRIS_AUTH_LATENCY_MS", "0"),
            ("OPEN_LIBRARY_BASE_URL", "http://localhost:9000"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/libris"));
        assert_eq!(config.session.ttl, TimeDelta::hours(2));
        assert_eq!(config.session.auth_latency, Duration::ZERO);
        assert_eq!(config.catalog.base_url.host_str(), Some("localhost"));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = load(&[("LIBRIS_PORT", ""), ("SENTRY_DSN", "  ")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("LIBRIS_HOST", "not-an-ip"),
            ("LIBRIS_PORT", "70000"),
            ("LIBRIS_SESSION_TTL_HOURS", "0"),
            ("LIBRIS_SESSION_TTL_HOURS", "-3"),
            ("LIBRIS_AUTH_LATENCY_MS", "soon"),
            ("OPEN_LIBRARY_BASE_URL", "not a url"),
            ("OPEN_LIBRARY_COVERS_URL", "ftp://covers.example"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            let ConfigError::InvalidEnvVar(name, _) = err;
            assert_eq!(name, key);
        }
    }
}
