//! Identity provider capability set.
//!
//! The core depends on this contract only. Any hosted auth service (or the
//! in-memory one in [`crate::in_memory`]) plugs in by implementing
//! [`IdentityProvider`] for a client-side handle and [`ProviderConnector`] for
//! building request-scoped handles on the server.
//!
//! Retries and backoff, if any, belong inside the adapter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tableside_auth::Role;
use tableside_core::UserId;
use tableside_events::Subscription;

use crate::ProviderError;

/// Opaque bearer credential issued by the provider.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are credentials; keep them out of logs.
impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Free-form metadata attached to the credential at sign-up.
///
/// Client-writable on most providers, so the core never derives permissions
/// from it; the role that counts is the one in the profile store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub name: Option<String>,
    pub role: Option<Role>,
}

/// The provider's view of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: UserId,
    pub email: String,
    pub metadata: UserMetadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: AccessToken,
    pub user: ProviderUser,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthChangeKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Session-changed notification pushed by the provider.
///
/// Changes may originate anywhere that shares the provider session (another
/// tab signing out, a background token refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChangeEvent {
    pub kind: AuthChangeKind,
    pub session: Option<ProviderSession>,
}

impl AuthChangeEvent {
    pub fn signed_in(session: ProviderSession) -> Self {
        Self { kind: AuthChangeKind::SignedIn, session: Some(session) }
    }

    pub fn signed_out() -> Self {
        Self { kind: AuthChangeKind::SignedOut, session: None }
    }

    /// The principal carried by the event, if the session is still active.
    pub fn principal(&self) -> Option<&ProviderUser> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// A provider client bound to one session context (a browser, or one request).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a credential and sign in with it.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<ProviderSession, ProviderError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, ProviderError>;

    /// Invalidate the bound session. Succeeds when there is none.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Resolve the principal of the bound session against the provider.
    ///
    /// `Ok(None)` when no credential is bound; an error when the provider cannot
    /// be reached or rejects the credential.
    async fn current_user(&self) -> Result<Option<ProviderUser>, ProviderError>;

    /// Locally held session, without a round trip.
    fn session(&self) -> Option<ProviderSession>;

    /// Push-style stream of session changes for this context.
    fn subscribe(&self) -> Subscription<AuthChangeEvent>;

    /// Dispatch a password-reset email whose link lands on `redirect_to`.
    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), ProviderError>;

    /// Change the password of the bound session's principal.
    async fn update_password(&self, password: &str) -> Result<(), ProviderError>;
}

/// Builds request-scoped provider clients from request credentials.
pub trait ProviderConnector: Send + Sync {
    fn connect(&self, credentials: Option<AccessToken>) -> Arc<dyn IdentityProvider>;
}

impl<C> ProviderConnector for Arc<C>
where
    C: ProviderConnector + ?Sized,
{
    fn connect(&self, credentials: Option<AccessToken>) -> Arc<dyn IdentityProvider> {
        (**self).connect(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_tokens_are_redacted_in_debug_output() {
        let token = AccessToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AccessToken(..)");
        assert_eq!(token.as_str(), "secret-value");
    }

    #[test]
    fn signed_out_events_carry_no_principal() {
        let event = AuthChangeEvent::signed_out();
        assert_eq!(event.kind, AuthChangeKind::SignedOut);
        assert!(event.principal().is_none());
    }
}
