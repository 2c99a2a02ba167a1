//! Access controller.
//!
//! Owns the session state machine and is the only writer of the durable
//! session slot:
//!
//! ```text
//! Initializing ──initialize──▶ Anonymous ◀──logout── Authenticated
//!       │                          │                      ▲
//!       └──────initialize──────────┴──login / register────┘
//! ```
//!
//! Session-mutating calls are serialized with a call-sequence guard. Each
//! call takes a ticket when it starts; when it finishes, it may commit only
//! if no newer call has started since. A stale login or registration is
//! reported as [`AuthError::Superseded`] and leaves the state alone.
//! Startup restore applies only if no session call committed while it ran.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use libris_core::Identity;

use crate::models::SessionState;
use crate::services::auth::{AuthError, AuthService, IssuedSession};
use crate::store::SessionStore;

/// Handle to the current session.
///
/// Shared through `Arc`; every consumer that needs session state is handed
/// this value explicitly.
pub struct AccessController {
    auth: AuthService,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<SessionState>,
    sequence: AtomicU64,
    // Number of committed session changes; the lock serializes commits.
    commits: Mutex<u64>,
}

impl std::fmt::Debug for AccessController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessController")
            .field("state", &*self.state.borrow())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl AccessController {
    /// Create a controller in the `Initializing` state.
    #[must_use]
    pub fn new(auth: AuthService, store: Arc<dyn SessionStore>) -> Self {
        Self {
            auth,
            store,
            state: watch::Sender::new(SessionState::initializing()),
            sequence: AtomicU64::new(0),
            commits: Mutex::new(0),
        }
    }

    /// The authentication service behind login and registration.
    #[must_use]
    pub const fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Restore the session from the durable slot.
    ///
    /// Meant to run once at startup. A missing token ends `Anonymous`. A
    /// token that fails to decode for any reason is removed from the slot
    /// and also ends `Anonymous`; the failure is logged, never returned.
    /// Always leaves `Initializing`, even when a login, registration, or
    /// logout committed first; that session is then kept.
    pub async fn initialize(&self) -> SessionState {
        let seen = *self.lock_commits();

        let store = Arc::clone(&self.store);
        let loaded = match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(Ok(token)) => token,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Could not read stored session, starting anonymous");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Session restore task failed");
                None
            }
        };

        let restored = loaded.and_then(|token| match self.auth.codec().decode(&token) {
            Ok(identity) => Some((identity, token)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding stored session token");
                None
            }
        });

        let commits = self.lock_commits();

        if *commits == seen {
            match restored {
                Some((identity, token)) => {
                    tracing::info!(user_id = %identity.id, "Session restored");
                    self.state.send_modify(|s| s.authenticate(identity, token));
                }
                None => {
                    if let Err(e) = self.store.clear() {
                        tracing::warn!(error = %e, "Could not clear stored session");
                    }
                    self.state.send_modify(SessionState::sign_out);
                }
            }
        } else {
            tracing::debug!("Restore superseded by a committed session call");
            self.state.send_modify(SessionState::finish_initializing);
        }

        self.snapshot()
    }

    /// Log in and make the result the current session.
    ///
    /// # Errors
    ///
    /// - Any `AuthError` from [`AuthService::login`], with the state unchanged
    /// - `AuthError::Superseded` if a newer session call started meanwhile
    /// - `AuthError::Storage` if the token could not be persisted
    pub async fn login(&self, email: &str, secret: &str) -> Result<Identity, AuthError> {
        let ticket = self.next_ticket();
        let _pending = PendingCall::start(&self.state);

        let issued = self.auth.login(email, secret).await?;
        self.commit(ticket, issued)
    }

    /// Register a new account and make it the current session.
    ///
    /// A superseded registration still leaves the new account in the
    /// credential store; only the session switch is discarded.
    ///
    /// # Errors
    ///
    /// - Any `AuthError` from [`AuthService::register`], with the state unchanged
    /// - `AuthError::Superseded` if a newer session call started meanwhile
    /// - `AuthError::Storage` if the token could not be persisted
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        name: &str,
    ) -> Result<Identity, AuthError> {
        let ticket = self.next_ticket();
        let _pending = PendingCall::start(&self.state);

        let issued = self.auth.register(email, secret, name).await?;
        self.commit(ticket, issued)
    }

    /// End the current session. Idempotent.
    ///
    /// Supersedes any in-flight login or registration. The in-memory state
    /// is cleared even if removing the stored token fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored token could not be removed.
    pub fn logout(&self) -> Result<(), AuthError> {
        let mut commits = self.lock_commits();
        let ticket = self.next_ticket();
        *commits += 1;

        let was_authenticated = self.state.borrow().is_authenticated();
        self.state.send_modify(SessionState::sign_out);
        if was_authenticated {
            tracing::info!(ticket, "Logged out");
        }

        self.store.clear()?;
        Ok(())
    }

    fn commit(&self, ticket: u64, issued: IssuedSession) -> Result<Identity, AuthError> {
        let mut commits = self.lock_commits();

        if !self.is_current(ticket) {
            tracing::debug!(ticket, user_id = %issued.identity.id, "Discarding superseded session");
            return Err(AuthError::Superseded);
        }

        self.store.save(&issued.token)?;
        *commits += 1;

        let identity = issued.identity.clone();
        tracing::info!(user_id = %identity.id, "Session started");
        self.state
            .send_modify(|s| s.authenticate(issued.identity, issued.token));

        Ok(identity)
    }

    fn next_ticket(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == ticket
    }

    // The guarded section never panics midway, so a poisoned lock is safe.
    fn lock_commits(&self) -> std::sync::MutexGuard<'_, u64> {
        self.commits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a login or registration as in flight until dropped, including when
/// the caller abandons the future.
struct PendingCall<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> PendingCall<'a> {
    fn start(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(SessionState::begin_call);
        Self { state }
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.state.send_modify(SessionState::end_call);
    }
}
