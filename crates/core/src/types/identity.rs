//! Registered account identity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Email, Role, UserId};

/// A registered account, without its secret.
///
/// This is what the rest of the system sees of an account: the credential
/// secret stays inside the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Opaque account ID.
    pub id: UserId,
    /// Unique email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Role deciding which views the account may enter.
    pub role: Role,
    /// Day the account was created, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_date: Option<NaiveDate>,
}

impl Identity {
    /// Whether this account may enter administrator-only views.
    #[must_use]
    pub const fn is_administrator(&self) -> bool {
        self.role.is_administrator()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case_with_iso_date() {
        let identity = Identity {
            id: UserId::new("2"),
            email: Email::parse("user@library.com").unwrap(),
            name: "John Doe".to_owned(),
            role: Role::Member,
            joined_date: NaiveDate::from_ymd_opt(2023, 3, 20),
        };

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["joinedDate"], "2023-03-20");
        assert_eq!(json["role"], "user");
        assert!(!identity.is_administrator());
    }

    #[test]
    fn test_missing_joined_date_is_omitted() {
        let identity = Identity {
            id: UserId::new("9"),
            email: Email::parse("x@library.com").unwrap(),
            name: "X".to_owned(),
            role: Role::Administrator,
            joined_date: None,
        };

        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("joinedDate").is_none());
        assert!(identity.is_administrator());
    }
}
