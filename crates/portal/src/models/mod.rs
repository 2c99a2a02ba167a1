//! Domain models for the portal.

pub mod session;

pub use session::{SessionPhase, SessionState, SessionView};
