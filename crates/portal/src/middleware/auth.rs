//! Session extractors for route handlers.
//!
//! Each extractor runs the route-guard policy for its access rule against
//! the current session. The client location being guarded is the request
//! path with its `/api` prefix removed, so `/api/profile` guards `/profile`.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use libris_core::Identity;

use super::guard::{GuardDecision, RETURN_PARAM, RouteAccess, evaluate};
use crate::state::AppState;

/// Seconds a client should wait before retrying while the session loads.
const RETRY_AFTER_SECS: &str = "1";

/// Extractor that requires a signed-in viewer.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireSession(identity): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", identity.name)
/// }
/// ```
pub struct RequireSession(pub Identity);

/// Extractor that requires a signed-in administrator.
pub struct RequireAdministrator(pub Identity);

/// Extractor that admits only anonymous viewers (login, register).
pub struct PublicOnly;

/// Rejection carrying the guard decision that stopped the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRejection {
    /// Access rule of the guarded route.
    pub access: RouteAccess,
    /// What the client should do instead.
    pub decision: GuardDecision,
}

#[derive(Serialize)]
struct RejectionBody<'a> {
    #[serde(flatten)]
    decision: &'a GuardDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<String>,
}

impl GuardRejection {
    fn status(&self) -> StatusCode {
        match (&self.decision, self.access) {
            (GuardDecision::ShowLoading, _) => StatusCode::SERVICE_UNAVAILABLE,
            (GuardDecision::RedirectToLogin { .. }, _) => StatusCode::UNAUTHORIZED,
            (_, RouteAccess::PublicOnly) => StatusCode::CONFLICT,
            _ => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let location = self.decision.location();
        let body = RejectionBody {
            decision: &self.decision,
            redirect: location.clone(),
        };
        let mut response = (self.status(), Json(body)).into_response();

        let headers = response.headers_mut();
        if self.decision == GuardDecision::ShowLoading {
            headers.insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        if let Some(value) = location.and_then(|l| HeaderValue::from_str(&l).ok()) {
            headers.insert(header::LOCATION, value);
        }

        response
    }
}

/// Run the guard for `access` against the request.
fn guard(parts: &Parts, state: &AppState, access: RouteAccess) -> Result<(), GuardRejection> {
    let path = parts.uri.path();
    let requested = path.strip_prefix("/api").filter(|p| p.starts_with('/')).unwrap_or(path);
    let recorded = recorded_location(parts.uri.query());

    let session = state.access().snapshot();
    match evaluate(access, &session, requested, recorded.as_deref()) {
        GuardDecision::Allow => Ok(()),
        decision => {
            tracing::debug!(?access, ?decision, requested, "Route guard rejected request");
            Err(GuardRejection { access, decision })
        }
    }
}

/// Read the `next` query parameter.
fn recorded_location(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == RETURN_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(std::borrow::Cow::into_owned)
}

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, RouteAccess::RequiresSession)?;
        signed_in(state, RouteAccess::RequiresSession).map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdministrator {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, RouteAccess::RequiresAdministrator)?;
        signed_in(state, RouteAccess::RequiresAdministrator).map(Self)
    }
}

impl FromRequestParts<AppState> for PublicOnly {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guard(parts, state, RouteAccess::PublicOnly)?;
        Ok(Self)
    }
}

/// The identity the guard just admitted.
///
/// A logout can land between the guard and this read; treat that as a
/// fresh redirect to login.
fn signed_in(state: &AppState, access: RouteAccess) -> Result<Identity, GuardRejection> {
    state
        .access()
        .snapshot()
        .identity()
        .cloned()
        .ok_or_else(|| GuardRejection {
            access,
            decision: GuardDecision::RedirectToLogin {
                return_to: super::guard::HOME_PATH.to_owned(),
            },
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_location_is_decoded() {
        assert_eq!(
            recorded_location(Some("a=1&next=%2Fmy-books%3Fpage%3D2")).as_deref(),
            Some("/my-books?page=2")
        );
        assert!(recorded_location(Some("a=1")).is_none());
        assert!(recorded_location(None).is_none());
    }

    #[test]
    fn test_loading_rejection_has_retry_after() {
        let response = GuardRejection {
            access: RouteAccess::RequiresSession,
            decision: GuardDecision::ShowLoading,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn test_redirect_rejections() {
        let login = GuardRejection {
            access: RouteAccess::RequiresSession,
            decision: GuardDecision::RedirectToLogin {
                return_to: "/profile".to_owned(),
            },
        }
        .into_response();
        assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(login.headers()[header::LOCATION], "/login?next=%2Fprofile");

        let home = GuardRejection {
            access: RouteAccess::RequiresAdministrator,
            decision: GuardDecision::RedirectToHome,
        }
        .into_response();
        assert_eq!(home.status(), StatusCode::FORBIDDEN);
        assert_eq!(home.headers()[header::LOCATION], "/");

        let back = GuardRejection {
            access: RouteAccess::PublicOnly,
            decision: GuardDecision::ReturnTo {
                location: "/my-books".to_owned(),
            },
        }
        .into_response();
        assert_eq!(back.status(), StatusCode::CONFLICT);
        assert_eq!(back.headers()[header::LOCATION], "/my-books");
    }
}
