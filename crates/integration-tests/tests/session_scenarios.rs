//! Account and session lifecycle scenarios through the access controller.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use libris_core::{Email, Identity, Role, UserId};
use libris_integration_tests::TestContext;
use libris_portal::services::{
    AccessController, AuthError, AuthService, TokenCodec, TokenError,
};
use libris_portal::store::{CredentialStore, FileSessionStore, SessionStore};

const ANN_PASSWORD: &str = "Bookworm42";

#[tokio::test]
async fn test_register_then_login_yields_same_identity() {
    let ctx = TestContext::new();
    ctx.access().initialize().await;

    let registered = ctx
        .access()
        .register("ann@example.com", ANN_PASSWORD, "Ann")
        .await
        .unwrap();
    assert_eq!(registered.role, Role::Member);
    assert!(registered.id.as_str().starts_with("user_"));
    assert!(registered.joined_date.is_some());

    ctx.access().logout().unwrap();
    let logged_in = ctx
        .access()
        .login("ann@example.com", ANN_PASSWORD)
        .await
        .unwrap();

    assert_eq!(logged_in, registered);
    assert_eq!(logged_in.name, "Ann");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected_without_mutation() {
    let ctx = TestContext::new();
    ctx.access().initialize().await;

    ctx.access()
        .register("ann@example.com", ANN_PASSWORD, "Ann")
        .await
        .unwrap();
    let accounts = ctx.state.credentials().len();

    let err = ctx
        .access()
        .register("ann@example.com", "Different9Secret", "Bob")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateEmail));
    assert_eq!(err.to_string(), "User with this email already exists");
    assert_eq!(ctx.state.credentials().len(), accounts);

    // Ann's session and account are untouched
    assert_eq!(ctx.access().snapshot().identity().unwrap().name, "Ann");
    ctx.access().logout().unwrap();
    let ann = ctx
        .access()
        .login("ann@example.com", ANN_PASSWORD)
        .await
        .unwrap();
    assert_eq!(ann.name, "Ann");
}

#[tokio::test]
async fn test_wrong_secret_and_unknown_email_look_the_same() {
    let ctx = TestContext::new();
    ctx.access().initialize().await;

    let wrong_secret = ctx
        .access()
        .login("user@library.com", "nope")
        .await
        .unwrap_err();
    let unknown_email = ctx
        .access()
        .login("nobody@library.com", "user123")
        .await
        .unwrap_err();

    assert_eq!(wrong_secret.to_string(), unknown_email.to_string());
    assert_eq!(wrong_secret.to_string(), "Invalid email or password");
    assert!(!ctx.access().snapshot().is_authenticated());
    assert!(ctx.stored_token().is_none());
}

#[tokio::test]
async fn test_initialize_without_token_is_anonymous() {
    let ctx = TestContext::new();
    assert!(ctx.access().snapshot().is_loading());

    let state = ctx.access().initialize().await;

    assert!(!state.is_authenticated());
    assert!(!state.is_loading());
    assert!(!state.is_initializing());
}

#[tokio::test]
async fn test_initialize_restores_valid_token() {
    let credentials = Arc::new(CredentialStore::with_demo_accounts());
    let admin = credentials.find_by_id(&UserId::new("1")).unwrap();
    let token = TokenCodec::new(credentials).encode(&admin);

    let ctx = TestContext::with_stored_token(&token);
    let state = ctx.access().initialize().await;

    assert_eq!(state.identity(), Some(&admin));
    assert!(state.is_administrator());
    assert_eq!(ctx.stored_token().as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn test_expired_token_is_discarded_on_restore() {
    let credentials = Arc::new(CredentialStore::with_demo_accounts());
    let member = credentials.find_by_id(&UserId::new("2")).unwrap();
    let codec = TokenCodec::new(Arc::clone(&credentials));

    // iat = now - 25h, exp = now - 1h
    let token = codec.encode_at(&member, Utc::now() - TimeDelta::hours(25));
    assert_eq!(codec.decode(&token), Err(TokenError::Expired));

    let ctx = TestContext::with_stored_token(&token);
    let state = ctx.access().initialize().await;

    assert!(!state.is_authenticated());
    assert!(!state.is_loading());
    assert!(ctx.stored_token().is_none());
}

#[test]
fn test_token_for_removed_account_is_unknown_subject() {
    let codec = TokenCodec::new(Arc::new(CredentialStore::with_demo_accounts()));
    let stranger = Identity {
        id: UserId::new("user_gone"),
        email: Email::parse("gone@example.com").unwrap(),
        name: "Gone".to_string(),
        role: Role::Member,
        joined_date: None,
    };

    let token = codec.encode(&stranger);
    assert_eq!(codec.decode(&token), Err(TokenError::UnknownSubject));
}

#[tokio::test]
async fn test_logout_twice_leaves_anonymous_and_empty_slot() {
    let ctx = TestContext::new();
    ctx.access().initialize().await;
    ctx.access()
        .login("user@library.com", "user123")
        .await
        .unwrap();
    assert!(ctx.stored_token().is_some());

    ctx.access().logout().unwrap();
    ctx.access().logout().unwrap();

    assert!(!ctx.access().snapshot().is_authenticated());
    assert!(ctx.stored_token().is_none());
}

#[tokio::test]
async fn test_durable_session_survives_a_new_controller() {
    let dir = tempfile::tempdir().unwrap();
    let credentials = Arc::new(CredentialStore::with_demo_accounts());

    let controller = |credentials: &Arc<CredentialStore>| {
        let codec = TokenCodec::new(Arc::clone(credentials));
        let auth = AuthService::new(Arc::clone(credentials), codec).with_latency(Duration::ZERO);
        AccessController::new(auth, Arc::new(FileSessionStore::new(dir.path())))
    };

    let first = controller(&credentials);
    first.initialize().await;
    let jane = first.login("jane@library.com", "user123").await.unwrap();
    drop(first);

    let second = controller(&credentials);
    let state = second.initialize().await;
    assert_eq!(state.identity(), Some(&jane));

    second.logout().unwrap();
    assert!(FileSessionStore::new(dir.path()).load().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_superseded_login_never_commits() {
    let credentials = Arc::new(CredentialStore::with_demo_accounts());
    let codec = TokenCodec::new(Arc::clone(&credentials));
    let auth = AuthService::new(credentials, codec).with_latency(Duration::from_millis(1000));
    let store = Arc::new(libris_portal::store::MemorySessionStore::new());
    let access = AccessController::new(auth, Arc::clone(&store) as Arc<dyn SessionStore>);
    access.initialize().await;

    let (older, newer) = tokio::join!(
        access.login("user@library.com", "user123"),
        access.login("jane@library.com", "user123"),
    );

    assert!(matches!(older, Err(AuthError::Superseded)));
    let jane = newer.unwrap();
    assert_eq!(access.snapshot().identity(), Some(&jane));

    let stored = store.load().unwrap().unwrap();
    assert_eq!(TokenCodec::inspect(&stored).unwrap().sub, jane.id);
}
