//! Process configuration, read once at startup.

use std::net::SocketAddr;

use crate::guard::RoutePolicy;

pub const DEFAULT_SESSION_COOKIE: &str = "tableside-session";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// Origin used in links sent by email, without a trailing slash.
    pub site_url: String,
    pub session_cookie: String,
    pub cookie_secure: bool,
    pub database_url: Option<String>,
    pub policy: RoutePolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            site_url: "http://localhost:8080".to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            cookie_secure: false,
            database_url: None,
            policy: RoutePolicy::default(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(raw) = get("BIND_ADDR") {
            config.bind_addr = raw.parse().map_err(|_| ConfigError::Invalid {
                var: "BIND_ADDR",
                value: raw.clone(),
            })?;
        }
        if let Some(url) = get("SITE_URL") {
            config.site_url = url.trim_end_matches('/').to_string();
        }
        if let Some(name) = get("SESSION_COOKIE") {
            config.session_cookie = name;
        }
        config.database_url = get("DATABASE_URL");

        // Secure cookies by default whenever the site is served over TLS.
        config.cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "COOKIE_SECURE",
                value: raw.clone(),
            })?,
            None => config.site_url.starts_with("https://"),
        };

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.site_url, "http://localhost:8080");
        assert_eq!(config.session_cookie, "tableside-session");
        assert!(!config.cookie_secure);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn reads_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("SITE_URL", "https://app.example.com/"),
            ("SESSION_COOKIE", "sid"),
            ("DATABASE_URL", "postgres://localhost/tableside"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.site_url, "https://app.example.com");
        assert_eq!(config.session_cookie, "sid");
        assert!(config.cookie_secure);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/tableside"));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = ApiConfig::from_lookup(lookup(&[("SESSION_COOKIE", "  "), ("DATABASE_URL", "")])).unwrap();
        assert_eq!(config.session_cookie, DEFAULT_SESSION_COOKIE);
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn rejects_malformed_values() {
        let err = ApiConfig::from_lookup(lookup(&[("BIND_ADDR", "localhost")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "BIND_ADDR",
                value: "localhost".to_string()
            }
        );
        assert!(ApiConfig::from_lookup(lookup(&[("COOKIE_SECURE", "maybe")])).is_err());
        assert!(!ApiConfig::from_lookup(lookup(&[("COOKIE_SECURE", "off"), ("SITE_URL", "https://x.io")]))
            .unwrap()
            .cookie_secure);
    }
}
