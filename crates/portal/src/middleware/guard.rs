//! Route-guard policy.
//!
//! Maps a client route and the current session state to a decision the
//! routing layer acts on. Pure functions; the extractors in
//! [`super::auth`] and the `/api/guard` endpoint both go through
//! [`evaluate`].

use serde::Serialize;

use crate::models::SessionState;

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";

/// Path of the registration view.
pub const REGISTER_PATH: &str = "/register";

/// Path of the home view.
pub const HOME_PATH: &str = "/";

/// Query parameter carrying the location to return to after login.
pub const RETURN_PARAM: &str = "next";

/// Who may enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    /// Anyone, at any time.
    Public,
    /// Signed-in viewers only.
    RequiresSession,
    /// Signed-in administrators only.
    RequiresAdministrator,
    /// Anonymous viewers only (login, register).
    PublicOnly,
}

/// What the routing layer should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Render the route.
    Allow,
    /// Session state is still resolving: render a loading indicator and do
    /// not redirect.
    ShowLoading,
    /// Send the viewer to the login view, returning to `return_to` after.
    RedirectToLogin {
        /// The originally requested location.
        return_to: String,
    },
    /// Send the viewer to the home view.
    RedirectToHome,
    /// Send a signed-in viewer back to the location recorded before login.
    ReturnTo {
        /// The recorded location.
        location: String,
    },
}

impl GuardDecision {
    /// Where a redirect decision points, if it is one.
    ///
    /// Login redirects carry the requested location in the `next` query
    /// parameter.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Allow | Self::ShowLoading => None,
            Self::RedirectToLogin { return_to } => Some(format!(
                "{LOGIN_PATH}?{RETURN_PARAM}={}",
                urlencoding::encode(return_to)
            )),
            Self::RedirectToHome => Some(HOME_PATH.to_owned()),
            Self::ReturnTo { location } => Some(location.clone()),
        }
    }
}

/// Access rule for a client route.
///
/// Query strings, fragments, and trailing slashes are ignored.
#[must_use]
pub fn route_access_for(path: &str) -> RouteAccess {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = match path.trim_end_matches('/') {
        "" => HOME_PATH,
        trimmed => trimmed,
    };

    match path {
        LOGIN_PATH | REGISTER_PATH => RouteAccess::PublicOnly,
        "/profile" | "/my-books" => RouteAccess::RequiresSession,
        "/admin" => RouteAccess::RequiresAdministrator,
        p if p.starts_with("/admin/") => RouteAccess::RequiresAdministrator,
        _ => RouteAccess::Public,
    }
}

/// Accept a return location only if it stays on this site.
///
/// The location must be a path starting with a single `/`. Protocol-relative
/// (`//host`) and absolute URLs are rejected, as are backslashes, which some
/// browsers treat as `/`.
#[must_use]
pub fn sanitize_return_path(path: &str) -> Option<&str> {
    let path = path.trim();
    let site_relative = path.starts_with('/') && !path.starts_with("//") && !path.contains('\\');
    site_relative.then_some(path)
}

/// Decide a navigation to `requested` under the given session state.
///
/// Guarded routes show loading while the session is resolving, which is
/// startup restore or a login/registration call that has not returned.
/// `recorded` is the location saved when the viewer was last sent to the
/// login view; it is only consulted for public-only routes.
#[must_use]
pub fn evaluate(
    access: RouteAccess,
    state: &SessionState,
    requested: &str,
    recorded: Option<&str>,
) -> GuardDecision {
    if access == RouteAccess::Public {
        return GuardDecision::Allow;
    }

    // Covers startup restore and any in-flight login or registration
    if state.is_loading() {
        return GuardDecision::ShowLoading;
    }

    match access {
        RouteAccess::Public => GuardDecision::Allow,
        RouteAccess::RequiresSession | RouteAccess::RequiresAdministrator
            if !state.is_authenticated() =>
        {
            GuardDecision::RedirectToLogin {
                return_to: sanitize_return_path(requested)
                    .unwrap_or(HOME_PATH)
                    .to_owned(),
            }
        }
        RouteAccess::RequiresAdministrator if !state.is_administrator() => {
            GuardDecision::RedirectToHome
        }
        RouteAccess::RequiresSession | RouteAccess::RequiresAdministrator => GuardDecision::Allow,
        RouteAccess::PublicOnly if state.is_authenticated() => recorded
            .and_then(sanitize_return_path)
            .filter(|location| route_access_for(location) != RouteAccess::PublicOnly)
            .map_or(GuardDecision::RedirectToHome, |location| {
                GuardDecision::ReturnTo {
                    location: location.to_owned(),
                }
            }),
        RouteAccess::PublicOnly => GuardDecision::Allow,
    }
}

/// Decide a navigation to `requested`, looking up its access rule.
#[must_use]
pub fn evaluate_path(state: &SessionState, requested: &str, recorded: Option<&str>) -> GuardDecision {
    evaluate(route_access_for(requested), state, requested, recorded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use libris_core::{Email, Identity, Role, UserId};

    fn initializing() -> SessionState {
        SessionState::initializing()
    }

    fn anonymous() -> SessionState {
        let mut state = SessionState::initializing();
        state.sign_out();
        state
    }

    fn signed_in(role: Role) -> SessionState {
        let mut state = SessionState::initializing();
        state.authenticate(
            Identity {
                id: UserId::new("2"),
                email: Email::parse("user@library.com").unwrap(),
                name: "John Doe".to_owned(),
                role,
                joined_date: None,
            },
            "a.b.c".to_owned(),
        );
        state
    }

    #[test]
    fn test_route_table() {
        assert_eq!(route_access_for("/"), RouteAccess::Public);
        assert_eq!(route_access_for("/search?q=dune"), RouteAccess::Public);
        assert_eq!(route_access_for("/login"), RouteAccess::PublicOnly);
        assert_eq!(route_access_for("/register/"), RouteAccess::PublicOnly);
        assert_eq!(route_access_for("/profile"), RouteAccess::RequiresSession);
        assert_eq!(route_access_for("/my-books#due"), RouteAccess::RequiresSession);
        assert_eq!(route_access_for("/admin"), RouteAccess::RequiresAdministrator);
        assert_eq!(
            route_access_for("/admin/books"),
            RouteAccess::RequiresAdministrator
        );
        assert_eq!(route_access_for("/administrivia"), RouteAccess::Public);
    }

    #[test]
    fn test_loading_never_redirects() {
        let state = initializing();
        for path in ["/profile", "/admin", "/login"] {
            assert_eq!(
                evaluate_path(&state, path, Some("/profile")),
                GuardDecision::ShowLoading
            );
        }
        assert_eq!(evaluate_path(&state, "/", None), GuardDecision::Allow);
    }

    #[test]
    fn test_inflight_call_shows_loading() {
        let mut state = anonymous();
        state.begin_call();

        assert_eq!(evaluate_path(&state, "/profile", None), GuardDecision::ShowLoading);
        assert_eq!(evaluate_path(&state, "/admin/books", None), GuardDecision::ShowLoading);
        assert_eq!(evaluate_path(&state, "/login", None), GuardDecision::ShowLoading);
        assert_eq!(evaluate_path(&state, "/books", None), GuardDecision::Allow);

        // A signed-in viewer switching accounts is also resolving
        let mut state = signed_in(Role::Member);
        state.begin_call();
        assert_eq!(evaluate_path(&state, "/profile", None), GuardDecision::ShowLoading);

        state.end_call();
        assert_eq!(evaluate_path(&state, "/profile", None), GuardDecision::Allow);
    }

    #[test]
    fn test_anonymous_is_sent_to_login_with_return_location() {
        let decision = evaluate_path(&anonymous(), "/my-books?page=2", None);
        assert_eq!(
            decision,
            GuardDecision::RedirectToLogin {
                return_to: "/my-books?page=2".to_owned()
            }
        );
        assert_eq!(
            decision.location().unwrap(),
            "/login?next=%2Fmy-books%3Fpage%3D2"
        );

        assert!(matches!(
            evaluate_path(&anonymous(), "/admin/books", None),
            GuardDecision::RedirectToLogin { .. }
        ));
    }

    #[test]
    fn test_member_is_sent_home_from_admin() {
        let state = signed_in(Role::Member);
        assert_eq!(
            evaluate_path(&state, "/admin", None),
            GuardDecision::RedirectToHome
        );
        assert_eq!(evaluate_path(&state, "/profile", None), GuardDecision::Allow);
    }

    #[test]
    fn test_administrator_is_allowed_everywhere_protected() {
        let state = signed_in(Role::Administrator);
        assert_eq!(evaluate_path(&state, "/admin/books", None), GuardDecision::Allow);
        assert_eq!(evaluate_path(&state, "/my-books", None), GuardDecision::Allow);
    }

    #[test]
    fn test_public_only_returns_signed_in_viewer() {
        let state = signed_in(Role::Member);
        assert_eq!(
            evaluate_path(&state, "/login", Some("/my-books")),
            GuardDecision::ReturnTo {
                location: "/my-books".to_owned()
            }
        );
        assert_eq!(
            evaluate_path(&state, "/register", None),
            GuardDecision::RedirectToHome
        );
        assert_eq!(
            evaluate_path(&state, "/login", Some("https://evil.example")),
            GuardDecision::RedirectToHome
        );
        assert_eq!(
            evaluate_path(&state, "/login", Some("/login")),
            GuardDecision::RedirectToHome
        );
        assert_eq!(evaluate_path(&anonymous(), "/login", None), GuardDecision::Allow);
    }

    #[test]
    fn test_sanitize_return_path() {
        assert_eq!(sanitize_return_path("/books/OL1W"), Some("/books/OL1W"));
        assert_eq!(sanitize_return_path("//evil.example"), None);
        assert_eq!(sanitize_return_path("https://evil.example"), None);
        assert_eq!(sanitize_return_path("/\\evil.example"), None);
        assert_eq!(sanitize_return_path("profile"), None);
    }

    #[test]
    fn test_decision_serializes_with_tag() {
        let json = serde_json::to_value(GuardDecision::ReturnTo {
            location: "/profile".to_owned(),
        })
        .unwrap();
        assert_eq!(json["decision"], "return_to");
        assert_eq!(json["location"], "/profile");
    }
}
