//! Session state published by the access controller.
//!
//! Derived, never stored: the durable slot holds only the token.

use serde::Serialize;

use libris_core::Identity;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Startup restore has not finished.
    Initializing,
    /// No valid session.
    Anonymous,
    /// A session is active.
    Authenticated {
        /// The signed-in account.
        identity: Identity,
        /// The token the session was restored from or issued with.
        token: String,
    },
}

/// Snapshot of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    phase: SessionPhase,
    pending: usize,
}

impl SessionState {
    /// The state before startup restore completes.
    #[must_use]
    pub const fn initializing() -> Self {
        Self {
            phase: SessionPhase::Initializing,
            pending: 0,
        }
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// The signed-in account, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match &self.phase {
            SessionPhase::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// The raw session token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Whether an identity is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated { .. })
    }

    /// Whether an identity is present and holds the administrator role.
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        self.identity().is_some_and(Identity::is_administrator)
    }

    /// Whether startup restore or a login/register call is still running.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_initializing() || self.pending > 0
    }

    /// Whether startup restore has not finished yet.
    #[must_use]
    pub const fn is_initializing(&self) -> bool {
        matches!(self.phase, SessionPhase::Initializing)
    }

    /// Serializable view, without the raw token.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            status: match self.phase {
                SessionPhase::Initializing => "initializing",
                SessionPhase::Anonymous => "anonymous",
                SessionPhase::Authenticated { .. } => "authenticated",
            },
            identity: self.identity().cloned(),
            is_authenticated: self.is_authenticated(),
            is_administrator: self.is_administrator(),
            is_loading: self.is_loading(),
        }
    }

    pub(crate) fn authenticate(&mut self, identity: Identity, token: String) {
        self.phase = SessionPhase::Authenticated { identity, token };
    }

    pub(crate) fn sign_out(&mut self) {
        self.phase = SessionPhase::Anonymous;
    }

    /// Leave `Initializing` without touching a session a newer call already
    /// committed.
    pub(crate) fn finish_initializing(&mut self) {
        if self.is_initializing() {
            self.phase = SessionPhase::Anonymous;
        }
    }

    pub(crate) const fn begin_call(&mut self) {
        self.pending += 1;
    }

    pub(crate) const fn end_call(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initializing()
    }
}

/// Session state as returned to HTTP clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// `initializing`, `anonymous`, or `authenticated`.
    pub status: &'static str,
    /// The signed-in account.
    pub identity: Option<Identity>,
    /// Whether an identity is present.
    pub is_authenticated: bool,
    /// Whether the identity is an administrator.
    pub is_administrator: bool,
    /// Whether a session operation is still running.
    pub is_loading: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use libris_core::{Email, Role, UserId};

    fn identity(role: Role) -> Identity {
        Identity {
            id: UserId::new("1"),
            email: Email::parse("admin@library.com").unwrap(),
            name: "Library Administrator".to_owned(),
            role,
            joined_date: None,
        }
    }

    #[test]
    fn test_initializing_is_loading_and_anonymous() {
        let state = SessionState::initializing();
        assert!(state.is_loading());
        assert!(!state.is_authenticated());
        assert!(!state.is_administrator());
        assert!(state.token().is_none());
    }

    #[test]
    fn test_flags_follow_identity() {
        let mut state = SessionState::initializing();
        state.authenticate(identity(Role::Administrator), "a.b.c".to_owned());

        assert!(!state.is_loading());
        assert!(state.is_authenticated());
        assert!(state.is_administrator());
        assert_eq!(state.token(), Some("a.b.c"));

        state.authenticate(identity(Role::Member), "d.e.f".to_owned());
        assert!(!state.is_administrator());

        state.sign_out();
        assert!(!state.is_authenticated());
        assert!(state.identity().is_none());
    }

    #[test]
    fn test_pending_calls_keep_loading() {
        let mut state = SessionState::initializing();
        state.finish_initializing();
        assert!(!state.is_loading());

        state.begin_call();
        state.begin_call();
        state.end_call();
        assert!(state.is_loading());
        state.end_call();
        assert!(!state.is_loading());

        state.end_call();
        assert!(!state.is_loading());
    }

    #[test]
    fn test_finish_initializing_keeps_committed_session() {
        let mut state = SessionState::initializing();
        state.authenticate(identity(Role::Member), "a.b.c".to_owned());
        state.finish_initializing();
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_view_omits_token() {
        let mut state = SessionState::initializing();
        state.authenticate(identity(Role::Administrator), "a.b.c".to_owned());

        let json = serde_json::to_value(state.view()).unwrap();
        assert_eq!(json["status"], "authenticated");
        assert_eq!(json["isAdministrator"], true);
        assert_eq!(json["identity"]["email"], "admin@library.com");
        assert!(!json.to_string().contains("a.b.c"));
    }
}
