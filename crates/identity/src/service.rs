//! Session service: the single place that talks to the identity provider and
//! the profile store.
//!
//! Every operation returns a typed [`AuthError`]; nothing here retries.

use std::sync::Arc;

use chrono::Utc;

use tableside_auth::{Role, User, validate_password, validate_registration};
use tableside_events::Subscription;

use crate::{
    AuthChangeEvent, AuthError, IdentityProvider, ProfileStore, ProviderError, ProviderUser, UserMetadata,
    UserProfile,
};

const DEFAULT_SITE_URL: &str = "http://localhost:8080";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

/// Session operations over one provider session context.
///
/// Cheap to construct: the server builds one per request around a
/// request-scoped provider client, the client side builds one per UI tree.
#[derive(Clone)]
pub struct SessionService {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    site_url: String,
}

impl SessionService {
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            provider,
            profiles,
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }

    /// Origin used to build links that land back on this site.
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Register a new account and provision its profile as the restaurant owner.
    ///
    /// Two steps, not atomic: once the credential exists the call succeeds even
    /// if writing the profile row fails. That failure is logged and the account
    /// then reads back as an unprovisioned user (no role, no restaurant).
    pub async fn register_account(&self, email: &str, password: &str, name: &str) -> Result<ProviderUser, AuthError> {
        validate_registration(email, password, name)?;

        let metadata = UserMetadata {
            name: Some(name.to_string()),
            role: Some(Role::Owner),
        };
        let session = self.provider.sign_up(email, password, metadata).await?;
        let user = session.user;

        let profile = UserProfile {
            id: user.id,
            email: user.email.clone(),
            name: name.to_string(),
            role: Role::Owner,
            restaurant_id: None,
            created_at: Utc::now(),
        };
        match self.profiles.insert(profile).await {
            Ok(()) => tracing::info!(user_id = %user.id, "account registered"),
            Err(e) => tracing::error!(
                user_id = %user.id,
                error = %e,
                "profile creation failed; account left unprovisioned"
            ),
        }

        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        tracing::debug!(user_id = %session.user.id, "signed in");
        Ok(session.user)
    }

    /// Invalidate the provider session. Succeeds when there is none.
    pub async fn end_session(&self) -> Result<(), AuthError> {
        match self.provider.sign_out().await {
            Ok(()) | Err(ProviderError::NoSession) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the current principal without touching the profile store.
    ///
    /// Errors are preserved so a caller making an access decision can fail closed.
    pub async fn resolve_principal(&self) -> Result<Option<ProviderUser>, AuthError> {
        Ok(self.provider.current_user().await?)
    }

    /// The current user, joined with their profile.
    ///
    /// `None` only when nobody is signed in (or the provider cannot say). A
    /// signed-in principal whose profile cannot be loaded comes back degraded,
    /// with no role and no restaurant, so it stays distinguishable from logged out.
    pub async fn fetch_current_user(&self) -> Option<User> {
        match self.resolve_principal().await {
            Ok(Some(principal)) => Some(self.user_for(principal).await),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not resolve current user");
                None
            }
        }
    }

    /// Join an already resolved principal with its profile, degrading the same
    /// way [`Self::fetch_current_user`] does. No provider round trip.
    pub async fn user_for(&self, principal: ProviderUser) -> User {
        match self.load_profile(&principal).await {
            Ok(profile) => User {
                id: principal.id,
                email: principal.email,
                name: profile.name,
                role: Some(profile.role),
                restaurant_id: profile.restaurant_id,
            },
            Err(e) => {
                tracing::warn!(user_id = %principal.id, error = %e, "profile join failed; returning unprovisioned user");
                User {
                    id: principal.id,
                    name: principal.metadata.name.clone().unwrap_or_default(),
                    email: principal.email,
                    role: None,
                    restaurant_id: None,
                }
            }
        }
    }

    async fn load_profile(&self, principal: &ProviderUser) -> Result<UserProfile, AuthError> {
        match self.profiles.get(principal.id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(AuthError::ProfileNotFound),
            Err(e) => {
                tracing::debug!(user_id = %principal.id, error = %e, "profile store lookup failed");
                Err(AuthError::ProfileNotFound)
            }
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let redirect_to = format!("{}{}", self.site_url, RESET_PASSWORD_PATH);
        Ok(self.provider.reset_password_for_email(email, &redirect_to).await?)
    }

    pub async fn set_password(&self, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;
        Ok(self.provider.update_password(new_password).await?)
    }

    /// Session-change notifications of the underlying provider context.
    pub fn subscribe(&self) -> Subscription<AuthChangeEvent> {
        self.provider.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tableside_core::UserId;

    use super::*;
    use crate::{
        InMemoryIdentityBackend, InMemoryIdentityProvider, InMemoryProfileStore, ProfileStoreError,
    };

    struct Harness {
        backend: Arc<InMemoryIdentityBackend>,
        profiles: Arc<InMemoryProfileStore>,
        service: SessionService,
    }

    fn harness() -> Harness {
        let backend = Arc::new(InMemoryIdentityBackend::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let provider = Arc::new(InMemoryIdentityProvider::new(backend.clone()));
        let service = SessionService::new(provider, profiles.clone()).with_site_url("https://app.example.com/");
        Harness { backend, profiles, service }
    }

    /// Profile store whose inserts always fail.
    struct BrokenProfileStore;

    #[async_trait]
    impl ProfileStore for BrokenProfileStore {
        async fn insert(&self, _profile: UserProfile) -> Result<(), ProfileStoreError> {
            Err(ProfileStoreError::Unavailable("connection refused".to_string()))
        }

        async fn get(&self, _id: UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
            Err(ProfileStoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn registration_provisions_an_owner_profile() {
        let h = harness();

        let registered = h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();
        assert_eq!(registered.metadata.role, Some(Role::Owner));

        let current = h.service.fetch_current_user().await.unwrap();
        assert_eq!(current.id, registered.id);
        assert_eq!(current.role, Some(Role::Owner));
        assert_eq!(current.name, "Ann");
        assert_eq!(current.restaurant_id, None);
        assert_eq!(h.profiles.len(), 1);
    }

    #[tokio::test]
    async fn registration_rejects_invalid_input_before_calling_the_provider() {
        let h = harness();

        let err = h.service.register_account("a@b.com", "short", "Ann").await.unwrap_err();

        assert_eq!(err, AuthError::Validation("Password must be at least 8 characters".into()));
        assert_eq!(h.backend.active_sessions(), 0);
        assert!(h.profiles.is_empty());
    }

    #[tokio::test]
    async fn failed_credential_creation_writes_no_profile() {
        let h = harness();
        h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();

        let err = h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap_err();

        assert_eq!(err, AuthError::EmailAlreadyRegistered);
        assert_eq!(h.profiles.len(), 1);
    }

    #[tokio::test]
    async fn profile_failure_still_reports_the_credential_and_degrades_the_user() {
        let backend = Arc::new(InMemoryIdentityBackend::new());
        let provider = Arc::new(InMemoryIdentityProvider::new(backend));
        let service = SessionService::new(provider, Arc::new(BrokenProfileStore));

        let registered = service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();

        let current = service.fetch_current_user().await.unwrap();
        assert_eq!(current.id, registered.id);
        assert_eq!(current.name, "Ann");
        assert_eq!(current.role, None);
        assert_eq!(current.restaurant_id, None);
        assert!(!current.is_provisioned());
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let h = harness();
        h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();
        h.service.end_session().await.unwrap();

        let err = h.service.authenticate("a@b.com", "Wrong123").await.unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(h.service.fetch_current_user().await, None);
    }

    #[tokio::test]
    async fn end_session_then_fetch_yields_nobody() {
        let h = harness();
        h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();

        h.service.end_session().await.unwrap();

        assert_eq!(h.service.fetch_current_user().await, None);
    }

    #[tokio::test]
    async fn end_session_without_a_session_succeeds() {
        let h = harness();
        assert_eq!(h.service.end_session().await, Ok(()));
    }

    #[tokio::test]
    async fn provider_outage_is_typed_and_fetch_absorbs_it() {
        let h = harness();
        h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();
        h.backend.set_available(false);

        assert!(matches!(h.service.resolve_principal().await, Err(AuthError::ProviderUnavailable(_))));
        assert!(matches!(
            h.service.authenticate("a@b.com", "Aa1aaaaa").await,
            Err(AuthError::ProviderUnavailable(_))
        ));
        assert_eq!(h.service.fetch_current_user().await, None);
    }

    #[tokio::test]
    async fn user_for_joins_the_profile_without_asking_the_provider() {
        let h = harness();
        let registered = h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();
        h.backend.set_available(false);

        let user = h.service.user_for(registered.clone()).await;

        assert_eq!(user.id, registered.id);
        assert_eq!(user.role, Some(Role::Owner));
        assert_eq!(user.name, "Ann");
    }

    #[tokio::test]
    async fn revoked_sessions_no_longer_resolve() {
        let h = harness();
        let registered = h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();

        h.backend.revoke_user_sessions(registered.id);

        assert_eq!(h.backend.active_sessions(), 0);
        assert_eq!(h.service.resolve_principal().await, Err(AuthError::InvalidCredentials));
        assert_eq!(h.service.fetch_current_user().await, None);
    }

    #[tokio::test]
    async fn password_reset_links_back_to_the_site() {
        let h = harness();
        h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();

        h.service.request_password_reset("a@b.com").await.unwrap();

        let sent = h.backend.password_resets();
        assert_eq!(sent[0].redirect_to, "https://app.example.com/auth/reset-password");
    }

    #[tokio::test]
    async fn set_password_validates_and_requires_a_session() {
        let h = harness();
        assert_eq!(
            h.service.set_password("weak").await,
            Err(AuthError::Validation("Password must be at least 8 characters".into()))
        );
        assert_eq!(h.service.set_password("Bb2bbbbb").await, Err(AuthError::NotAuthenticated));

        h.service.register_account("a@b.com", "Aa1aaaaa", "Ann").await.unwrap();
        assert_eq!(h.service.set_password("Bb2bbbbb").await, Ok(()));
    }
}
