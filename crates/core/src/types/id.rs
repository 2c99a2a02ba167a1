//! Account identifiers.
//!
//! Account IDs are opaque strings: the seeded accounts use short numeric
//! strings (`"1"`, `"2"`) and registered accounts get a `user_` prefixed UUID.
//! Nothing in the system interprets their contents.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a registered account.
///
/// # Example
///
/// ```rust
/// # use libris_core::UserId;
/// let seeded = UserId::new("1");
/// let registered = UserId::generate();
///
/// assert_eq!(seeded.as_str(), "1");
/// assert!(registered.as_str().starts_with("user_"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Prefix given to IDs minted for newly registered accounts.
    pub const GENERATED_PREFIX: &'static str = "user_";

    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh identifier for a newly registered account.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::GENERATED_PREFIX, Uuid::new_v4().simple()))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the ID and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_prefixed() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with(UserId::GENERATED_PREFIX));
    }

    #[test]
    fn test_display_matches_inner() {
        let id = UserId::new("42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(String::from(id), "42");
    }
}
