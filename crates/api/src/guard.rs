//! Route guard decision.
//!
//! [`decide`] is a pure function of the path and the outcome of principal
//! resolution for that request. The axum glue lives in [`crate::middleware`].

/// Path classification used by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    pub home: String,
    pub login: String,
    pub register: String,
    pub dashboard: String,
    /// Prefix that marks the auth area (no login redirect on resolution errors).
    pub auth_prefix: String,
    /// Paths reachable without a principal, besides `home`.
    pub public_paths: Vec<String>,
    /// Prefixes the guard never looks at (assets, JSON API).
    pub bypass_prefixes: Vec<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            login: "/auth/login".to_string(),
            register: "/auth/register".to_string(),
            dashboard: "/dashboard".to_string(),
            auth_prefix: "/auth/".to_string(),
            public_paths: vec![
                "/auth/login".to_string(),
                "/auth/register".to_string(),
                "/auth/forgot-password".to_string(),
                "/auth/reset-password".to_string(),
            ],
            bypass_prefixes: vec![
                "/api".to_string(),
                "/static".to_string(),
                "/assets".to_string(),
                "/favicon.ico".to_string(),
                "/public".to_string(),
            ],
        }
    }
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PathClass {
    Bypass,
    Public,
    Protected,
}

impl RoutePolicy {
    pub fn classify(&self, path: &str) -> PathClass {
        if self.bypass_prefixes.iter().any(|p| under(path, p)) {
            PathClass::Bypass
        } else if path == self.home || self.public_paths.iter().any(|p| under(path, p)) {
            PathClass::Public
        } else {
            PathClass::Protected
        }
    }

    pub fn bypasses(&self, path: &str) -> bool {
        self.classify(path) == PathClass::Bypass
    }

    /// Login/register forms and the home page are never shown to a signed-in user.
    fn sends_principal_to_dashboard(&self, path: &str) -> bool {
        path == self.home || under(path, &self.login) || under(path, &self.register)
    }

    fn login_with_return_to(&self, path: &str) -> String {
        format!("{}?redirectTo={}", self.login, urlencoding::encode(path))
    }
}

/// What principal resolution produced for the request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrincipalOutcome {
    Present,
    Absent,
    /// Resolution errored (provider unreachable, malformed credentials).
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Not a navigation path; the guard does not apply.
    Bypass,
    Allow,
    /// Redirect to this location (path plus query).
    Redirect(String),
}

pub fn decide(policy: &RoutePolicy, outcome: PrincipalOutcome, path: &str) -> GuardDecision {
    let class = policy.classify(path);
    match (outcome, class) {
        (_, PathClass::Bypass) => GuardDecision::Bypass,

        (PrincipalOutcome::Present, _) if policy.sends_principal_to_dashboard(path) => {
            GuardDecision::Redirect(policy.dashboard.clone())
        }
        (PrincipalOutcome::Present, _) => GuardDecision::Allow,

        (PrincipalOutcome::Absent, PathClass::Public) => GuardDecision::Allow,
        (PrincipalOutcome::Absent, PathClass::Protected) => GuardDecision::Redirect(policy.login_with_return_to(path)),

        // Fail closed everywhere except the auth area, which would loop.
        (PrincipalOutcome::Failed, _) if under(path, &policy.auth_prefix) => GuardDecision::Allow,
        (PrincipalOutcome::Failed, _) => GuardDecision::Redirect(policy.login.clone()),
    }
}

/// Sanitize a client-supplied `redirectTo`: only same-origin absolute paths
/// are honoured, anything else falls back to the dashboard.
pub fn return_target(policy: &RoutePolicy, redirect_to: Option<&str>) -> String {
    match redirect_to {
        Some(target)
            if target.starts_with('/')
                && !target.starts_with("//")
                && !target.contains('\\')
                && policy.classify(target) == PathClass::Protected =>
        {
            target.to_string()
        }
        _ => policy.dashboard.clone(),
    }
}
