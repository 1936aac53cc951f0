use std::sync::Arc;

use tableside_identity::{AccessToken, ProfileStore, ProviderConnector, SessionService};

use crate::config::ApiConfig;
use crate::guard::RoutePolicy;

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: Arc<str>,
    pub secure: bool,
}

/// Shared across requests. Holds factories and policy only; no session state.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn ProviderConnector>,
    pub profiles: Arc<dyn ProfileStore>,
    pub policy: Arc<RoutePolicy>,
    pub site_url: Arc<str>,
    pub cookie: CookieSettings,
}

impl AppState {
    pub fn new(connector: Arc<dyn ProviderConnector>, profiles: Arc<dyn ProfileStore>, config: &ApiConfig) -> Self {
        Self {
            connector,
            profiles,
            policy: Arc::new(config.policy.clone()),
            site_url: Arc::from(config.site_url.as_str()),
            cookie: CookieSettings {
                name: Arc::from(config.session_cookie.as_str()),
                secure: config.cookie_secure,
            },
        }
    }

    /// A session service bound to one request's credentials.
    pub fn session_service(&self, credentials: Option<AccessToken>) -> SessionService {
        SessionService::new(self.connector.connect(credentials), self.profiles.clone())
            .with_site_url(self.site_url.as_ref())
    }
}
