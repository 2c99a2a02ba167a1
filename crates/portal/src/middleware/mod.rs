//! Route guarding for the portal.
//!
//! - [`guard`] - the pure policy: route table, decisions, return paths
//! - [`auth`] - axum extractors that apply the policy to a request

pub mod auth;
pub mod guard;

pub use auth::{GuardRejection, PublicOnly, RequireAdministrator, RequireSession};
pub use guard::{GuardDecision, RouteAccess, evaluate, evaluate_path, route_access_for};
