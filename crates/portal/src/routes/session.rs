//! Session, route-guard, and account view handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use libris_core::Identity;

use crate::error::{AppError, Result};
use crate::middleware::guard::{GuardDecision, RouteAccess, evaluate, route_access_for};
use crate::middleware::{RequireAdministrator, RequireSession};
use crate::models::SessionView;
use crate::state::AppState;
use crate::store::credentials::RoleCounts;

/// Query for `GET /api/guard`.
#[derive(Debug, Deserialize)]
pub struct GuardQuery {
    /// Client route being navigated to.
    pub path: String,
    /// Location recorded before the viewer was sent to login.
    pub next: Option<String>,
}

/// Route-guard decision for one client route.
#[derive(Debug, Serialize)]
pub struct GuardResponse {
    pub path: String,
    pub access: RouteAccess,
    #[serde(flatten)]
    pub decision: GuardDecision,
    /// Redirect target, when the decision is a redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Administrator dashboard summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub administrator: Identity,
    pub accounts: usize,
    pub roles: RoleCounts,
    pub members: Vec<Identity>,
}

/// Current session snapshot.
pub async fn session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.access().snapshot().view())
}

/// Decide a client navigation.
///
/// # Errors
///
/// Returns 400 if `path` is not a site-relative path.
pub async fn guard(
    State(state): State<AppState>,
    Query(query): Query<GuardQuery>,
) -> Result<Json<GuardResponse>> {
    if !query.path.starts_with('/') {
        return Err(AppError::BadRequest(format!(
            "path must start with '/': {}",
            query.path
        )));
    }

    let access = route_access_for(&query.path);
    let decision = evaluate(
        access,
        &state.access().snapshot(),
        &query.path,
        query.next.as_deref(),
    );

    Ok(Json(GuardResponse {
        redirect: decision.location(),
        path: query.path,
        access,
        decision,
    }))
}

/// The signed-in viewer's profile.
pub async fn profile(RequireSession(identity): RequireSession) -> Json<Identity> {
    Json(identity)
}

/// Account overview for administrators.
pub async fn admin(
    State(state): State<AppState>,
    RequireAdministrator(administrator): RequireAdministrator,
) -> Json<AdminOverview> {
    let credentials = state.credentials();
    let members = credentials.identities();

    Json(AdminOverview {
        administrator,
        accounts: members.len(),
        roles: credentials.role_counts(),
        members,
    })
}
