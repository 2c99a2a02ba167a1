//! In-memory credential store.
//!
//! Holds every known account together with its secret. The store is an
//! explicitly constructed value shared through `Arc`; there is no global
//! account list.

use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use libris_core::{Email, Identity, Role, UserId};

use super::StoreError;

/// An account as submitted for insertion.
#[derive(Debug)]
pub struct NewAccount {
    /// Identity to register.
    pub identity: Identity,
    /// Plain secret the account logs in with.
    pub secret: SecretString,
}

/// Stored account: identity plus secret.
///
/// `SecretString` keeps the secret out of `Debug` output and logs.
#[derive(Debug)]
struct AccountRecord {
    identity: Identity,
    secret: SecretString,
}

/// Number of accounts per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RoleCounts {
    /// Regular members.
    pub members: usize,
    /// Administrators.
    pub administrators: usize,
}

/// The authoritative in-memory set of accounts.
///
/// Emails are unique. Lookups match email and secret exactly, including case.
#[derive(Debug, Default)]
pub struct CredentialStore {
    accounts: RwLock<Vec<AccountRecord>>,
}

impl CredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the demo accounts.
    ///
    /// | email               | secret     | role          |
    /// |---------------------|------------|---------------|
    /// | `admin@library.com` | `admin123` | administrator |
    /// | `user@library.com`  | `user123`  | member        |
    /// | `jane@library.com`  | `user123`  | member        |
    #[must_use]
    pub fn with_demo_accounts() -> Self {
        let accounts = demo_accounts()
            .into_iter()
            .map(|account| AccountRecord {
                identity: account.identity,
                secret: account.secret,
            })
            .collect();

        Self {
            accounts: RwLock::new(accounts),
        }
    }

    /// Find the account matching both email and secret.
    #[must_use]
    pub fn find_by_email_and_secret(&self, email: &Email, secret: &str) -> Option<Identity> {
        self.read(|accounts| {
            accounts
                .iter()
                .find(|a| a.identity.email == *email && a.secret.expose_secret() == secret)
                .map(|a| a.identity.clone())
        })
    }

    /// Find the account registered under an email.
    #[must_use]
    pub fn find_by_email(&self, email: &Email) -> Option<Identity> {
        self.read(|accounts| {
            accounts
                .iter()
                .find(|a| a.identity.email == *email)
                .map(|a| a.identity.clone())
        })
    }

    /// Find the account with the given ID.
    #[must_use]
    pub fn find_by_id(&self, id: &UserId) -> Option<Identity> {
        self.read(|accounts| {
            accounts
                .iter()
                .find(|a| a.identity.id == *id)
                .map(|a| a.identity.clone())
        })
    }

    /// Append a new account.
    ///
    /// The uniqueness check and the append happen under one write lock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is already registered;
    /// the store is left unchanged.
    pub fn insert(&self, account: NewAccount) -> Result<(), StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if accounts
            .iter()
            .any(|a| a.identity.email == account.identity.email)
        {
            return Err(StoreError::DuplicateEmail);
        }

        accounts.push(AccountRecord {
            identity: account.identity,
            secret: account.secret,
        });

        Ok(())
    }

    /// Snapshot of every identity, in registration order.
    #[must_use]
    pub fn identities(&self) -> Vec<Identity> {
        self.read(|accounts| accounts.iter().map(|a| a.identity.clone()).collect())
    }

    /// Count accounts per role.
    #[must_use]
    pub fn role_counts(&self) -> RoleCounts {
        self.read(|accounts| {
            accounts
                .iter()
                .fold(RoleCounts::default(), |mut counts, a| {
                    match a.identity.role {
                        Role::Member => counts.members += 1,
                        Role::Administrator => counts.administrators += 1,
                    }
                    counts
                })
        })
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(Vec::len)
    }

    /// Whether the store has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Appends are the only mutation and cannot leave the list half-written,
    // so a poisoned lock still guards consistent data.
    fn read<T>(&self, f: impl FnOnce(&Vec<AccountRecord>) -> T) -> T {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        f(&accounts)
    }
}

/// The seeded demo accounts.
fn demo_accounts() -> Vec<NewAccount> {
    let seed = |id: &str, email: &str, secret: &str, name: &str, role, joined: (i32, u32, u32)| {
        Email::parse(email).ok().map(|email| NewAccount {
            identity: Identity {
                id: UserId::new(id),
                email,
                name: name.to_owned(),
                role,
                joined_date: NaiveDate::from_ymd_opt(joined.0, joined.1, joined.2),
            },
            secret: SecretString::from(secret.to_owned()),
        })
    };

    [
        seed(
            "1",
            "admin@library.com",
            "admin123",
            "Library Administrator",
            Role::Administrator,
            (2023, 1, 15),
        ),
        seed(
            "2",
            "user@library.com",
            "user123",
            "John Doe",
            Role::Member,
            (2023, 3, 20),
        ),
        seed(
            "3",
            "jane@library.com",
            "user123",
            "Jane Smith",
            Role::Member,
            (2023, 2, 10),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn account(id: &str, address: &str, secret: &str) -> NewAccount {
        NewAccount {
            identity: Identity {
                id: UserId::new(id),
                email: email(address),
                name: "Ann".to_owned(),
                role: Role::Member,
                joined_date: None,
            },
            secret: SecretString::from(secret.to_owned()),
        }
    }

    #[test]
    fn test_demo_accounts_are_seeded() {
        let store = CredentialStore::with_demo_accounts();
        assert_eq!(store.len(), 3);
        assert_eq!(
            store.role_counts(),
            RoleCounts {
                members: 2,
                administrators: 1
            }
        );

        let admin = store
            .find_by_email_and_secret(&email("admin@library.com"), "admin123")
            .unwrap();
        assert_eq!(admin.id, UserId::new("1"));
        assert!(admin.is_administrator());
        assert_eq!(admin.joined_date, NaiveDate::from_ymd_opt(2023, 1, 15));
    }

    #[test]
    fn test_lookup_is_exact_and_case_sensitive() {
        let store = CredentialStore::with_demo_accounts();
        assert!(
            store
                .find_by_email_and_secret(&email("user@library.com"), "USER123")
                .is_none()
        );
        assert!(
            store
                .find_by_email_and_secret(&email("User@library.com"), "user123")
                .is_none()
        );
        assert!(store.find_by_email(&email("User@library.com")).is_none());
        assert!(store.find_by_email(&email("user@library.com")).is_some());
    }

    #[test]
    fn test_insert_then_find() {
        let store = CredentialStore::new();
        assert!(store.is_empty());

        store.insert(account("a", "a@x.com", "Passw0rd")).unwrap();

        let found = store.find_by_id(&UserId::new("a")).unwrap();
        assert_eq!(found.email, email("a@x.com"));
        assert!(
            store
                .find_by_email_and_secret(&email("a@x.com"), "Passw0rd")
                .is_some()
        );
    }

    #[test]
    fn test_duplicate_email_leaves_store_unchanged() {
        let store = CredentialStore::new();
        store.insert(account("a", "a@x.com", "Passw0rd")).unwrap();

        let err = store.insert(account("b", "a@x.com", "Other1x")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.len(), 1);
        assert!(store.find_by_id(&UserId::new("b")).is_none());
        assert!(
            store
                .find_by_email_and_secret(&email("a@x.com"), "Other1x")
                .is_none()
        );
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let store = CredentialStore::with_demo_accounts();
        let debug_output = format!("{store:?}");
        assert!(debug_output.contains("admin@library.com"));
        assert!(!debug_output.contains("admin123"));
    }
}
