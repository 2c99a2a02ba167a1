//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleError(pub String);

/// Role of an account, deciding which views it may enter.
///
/// Serialized as `user` / `admin`, the names carried in session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Regular library member.
    #[default]
    #[serde(rename = "user")]
    Member,
    /// Library staff with access to the administration views.
    #[serde(rename = "admin")]
    Administrator,
}

impl Role {
    /// Whether this role may enter administrator-only views.
    #[must_use]
    pub const fn is_administrator(self) -> bool {
        matches!(self, Self::Administrator)
    }

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "user",
            Self::Administrator => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "member" => Ok(Self::Member),
            "admin" | "administrator" => Ok(Self::Administrator),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}
