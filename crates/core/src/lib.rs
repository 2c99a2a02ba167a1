//! Libris Core - Shared types library.
//!
//! This crate provides the account types used across all Libris components:
//! - `portal` - Session handling, route guards, and the catalog client
//! - `cli` - Command-line access to the same session slot
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for user IDs, emails, roles, and identities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
