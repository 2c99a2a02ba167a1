//! Business logic services for the portal.
//!
//! # Services
//!
//! - `token` - Session token encoding and resolution
//! - `auth` - Login and registration against the credential store
//! - `access` - The session state machine and its call-sequence guard

pub mod access;
pub mod auth;
pub mod token;

pub use access::AccessController;
pub use auth::{AuthError, AuthService, IssuedSession};
pub use token::{TokenClaims, TokenCodec, TokenError};
