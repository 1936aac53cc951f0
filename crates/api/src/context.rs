use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use tableside_core::UserId;
use tableside_identity::{AccessToken, ProviderUser, SessionService};

use crate::app::AppState;
use crate::middleware::credentials_from;

/// Principal resolved by the route guard for this request.
///
/// Only present on navigation requests the guard allowed with a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user: ProviderUser,
}

impl PrincipalContext {
    pub fn new(user: ProviderUser) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn into_principal(self) -> ProviderUser {
        self.user
    }
}

/// Request-scoped session: the caller's credentials and a [`SessionService`]
/// bound to them.
pub struct RequestSession {
    pub credentials: Option<AccessToken>,
    pub service: SessionService,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequestSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let credentials = credentials_from(&jar, &parts.headers, &state.cookie.name);
        Ok(Self {
            service: state.session_service(credentials.clone()),
            credentials,
        })
    }
}
