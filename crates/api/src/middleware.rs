use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use tableside_identity::AccessToken;

use crate::app::AppState;
use crate::context::PrincipalContext;
use crate::guard::{self, GuardDecision, PrincipalOutcome};

/// Route guard: resolves the caller's principal and allows or redirects the
/// navigation before any handler runs.
pub async fn route_guard(State(state): State<AppState>, jar: CookieJar, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if state.policy.bypasses(&path) {
        return next.run(req).await;
    }

    let credentials = credentials_from(&jar, req.headers(), &state.cookie.name);
    let (outcome, principal) = if credentials.is_none() {
        (PrincipalOutcome::Absent, None)
    } else {
        match state.session_service(credentials).resolve_principal().await {
            Ok(Some(user)) => (PrincipalOutcome::Present, Some(user)),
            Ok(None) => (PrincipalOutcome::Absent, None),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "principal resolution failed; treating request as anonymous");
                (PrincipalOutcome::Failed, None)
            }
        }
    };

    match guard::decide(&state.policy, outcome, &path) {
        GuardDecision::Redirect(location) => {
            tracing::debug!(path = %path, outcome = ?outcome, location = %location, "guard redirect");
            Redirect::temporary(&location).into_response()
        }
        GuardDecision::Allow | GuardDecision::Bypass => {
            if let Some(user) = principal {
                req.extensions_mut().insert(PrincipalContext::new(user));
            }
            next.run(req).await
        }
    }
}

/// Session cookie first, then `Authorization: Bearer`.
pub fn credentials_from(jar: &CookieJar, headers: &HeaderMap, cookie_name: &str) -> Option<AccessToken> {
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(AccessToken::new(value));
        }
    }
    extract_bearer(headers).map(AccessToken::new)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("origin-when-cross-origin"));
    res
}
