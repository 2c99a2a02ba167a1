//! Core types for Libris.
//!
//! This module provides type-safe wrappers for account concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod role;

pub use email::{Email, EmailError};
pub use id::UserId;
pub use identity::Identity;
pub use role::{Role, RoleError};
