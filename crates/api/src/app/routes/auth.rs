//! JSON auth endpoints under `/api/auth`.
//!
//! Login and register hand the provider's access token to the browser as an
//! HttpOnly session cookie; every later request is resolved from that cookie
//! (or a bearer header) by a request-scoped [`SessionService`].

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;

use tableside_identity::{AccessToken, AuthError, SessionService};

use crate::app::{AppState, errors};
use crate::context::RequestSession;
use crate::guard;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "redirectTo", default)]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/update-password", post(update_password))
        .route("/me", get(me))
}

fn session_cookie(state: &AppState, token: &AccessToken) -> Cookie<'static> {
    Cookie::build((state.cookie.name.to_string(), token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie.secure)
        .build()
}

/// Attach the session cookie for the service's freshly bound session and
/// return the joined user.
async fn signed_in(
    state: &AppState,
    jar: CookieJar,
    service: &SessionService,
    status: StatusCode,
    redirect_to: String,
) -> Response {
    let Some(session) = service.provider().session() else {
        tracing::error!("provider reported success without binding a session");
        return errors::auth_error_to_response(AuthError::Unknown("No session was issued".to_string()));
    };
    let user = service.fetch_current_user().await;
    let jar = jar.add(session_cookie(state, &session.access_token));

    (
        status,
        jar,
        Json(json!({
            "user": user,
            "redirectTo": redirect_to,
        })),
    )
        .into_response()
}

/// POST /api/auth/login
async fn login(State(state): State<AppState>, jar: CookieJar, Json(req): Json<LoginRequest>) -> Response {
    let service = state.session_service(None);
    match service.authenticate(&req.email, &req.password).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "signed in");
            let target = guard::return_target(&state.policy, req.redirect_to.as_deref());
            signed_in(&state, jar, &service, StatusCode::OK, target).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "sign-in rejected");
            errors::auth_error_to_response(e)
        }
    }
}

/// POST /api/auth/register
async fn register(State(state): State<AppState>, jar: CookieJar, Json(req): Json<RegisterRequest>) -> Response {
    let service = state.session_service(None);
    match service.register_account(&req.email, &req.password, &req.name).await {
        Ok(_) => {
            let target = state.policy.dashboard.clone();
            signed_in(&state, jar, &service, StatusCode::CREATED, target).await
        }
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// POST /api/auth/logout - the cookie is cleared even when the provider call fails.
async fn logout(State(state): State<AppState>, jar: CookieJar, session: RequestSession) -> Response {
    let result = match session.credentials {
        Some(_) => session.service.end_session().await,
        None => Ok(()),
    };
    let jar = jar.remove(Cookie::build((state.cookie.name.to_string(), "")).path("/"));

    match result {
        Ok(()) => (jar, StatusCode::NO_CONTENT).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "remote sign-out failed; local session cleared");
            (jar, errors::auth_error_to_response(e)).into_response()
        }
    }
}

/// POST /api/auth/forgot-password
async fn forgot_password(State(state): State<AppState>, Json(req): Json<ForgotPasswordRequest>) -> Response {
    match state.session_service(None).request_password_reset(&req.email).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// POST /api/auth/update-password
async fn update_password(session: RequestSession, Json(req): Json<UpdatePasswordRequest>) -> Response {
    if session.credentials.is_none() {
        return errors::auth_error_to_response(AuthError::NotAuthenticated);
    }
    match session.service.set_password(&req.password).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// GET /api/auth/me
async fn me(session: RequestSession) -> Response {
    match session.service.fetch_current_user().await {
        Some(user) => Json(user).into_response(),
        None => errors::auth_error_to_response(AuthError::NotAuthenticated),
    }
}
