//! Navigation endpoints. The route guard has already allowed or redirected
//! the request by the time these run; they render JSON page models.

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use tableside_auth::{User, section_allows, visible_navigation};

use crate::app::{AppState, errors};
use crate::context::PrincipalContext;
use crate::guard;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| page("home")))
        .route("/auth/login", get(login))
        .route("/auth/register", get(|| page("register")))
        .route("/auth/forgot-password", get(|| page("forgot-password")))
        .route("/auth/reset-password", get(|| page("reset-password")))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/:section", get(dashboard_section))
}

async fn page(name: &'static str) -> Json<serde_json::Value> {
    Json(json!({ "page": name }))
}

/// GET /auth/login - echoes the sanitized return target for the form.
async fn login(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Json<serde_json::Value> {
    Json(json!({
        "page": "login",
        "redirectTo": guard::return_target(&state.policy, query.redirect_to.as_deref()),
    }))
}

/// Join the principal the guard resolved with its profile. `None` only if the
/// guard did not run for this route.
async fn current_user(state: &AppState, principal: Option<PrincipalContext>) -> Option<User> {
    let principal = principal?;
    tracing::trace!(user_id = %principal.user_id(), "joining profile for resolved principal");
    // The profile join needs no credentials.
    Some(state.session_service(None).user_for(principal.into_principal()).await)
}

/// GET /dashboard - current user plus the sidebar entries their role allows.
async fn dashboard(State(state): State<AppState>, principal: Option<Extension<PrincipalContext>>) -> Response {
    let Some(user) = current_user(&state, principal.map(|Extension(p)| p)).await else {
        return Redirect::temporary(&state.policy.login).into_response();
    };

    let navigation = visible_navigation(Some(&user));
    (
        StatusCode::OK,
        Json(json!({
            "page": "dashboard",
            "provisioned": user.is_provisioned(),
            "roleLabel": user.role.map(|role| role.label()),
            "user": user,
            "navigation": navigation,
        })),
    )
        .into_response()
}

/// GET /dashboard/:section - 403 when the role does not open this section.
async fn dashboard_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    principal: Option<Extension<PrincipalContext>>,
) -> Response {
    let Some(user) = current_user(&state, principal.map(|Extension(p)| p)).await else {
        return Redirect::temporary(&state.policy.login).into_response();
    };

    let path = format!("{}/{}", state.policy.dashboard, section);
    match section_allows(&path, Some(&user)) {
        Some(true) => (
            StatusCode::OK,
            Json(json!({
                "page": section,
                "user": user,
            })),
        )
            .into_response(),
        Some(false) => {
            tracing::debug!(user_id = %user.id, path = %path, "section not allowed for role");
            errors::json_error(StatusCode::FORBIDDEN, "forbidden", "Your role does not have access to this page")
        }
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("no page at {path}")),
    }
}
