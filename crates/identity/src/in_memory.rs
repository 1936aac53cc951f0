//! In-memory identity provider for tests/dev.
//!
//! [`InMemoryIdentityBackend`] plays the hosted service (accounts, sessions,
//! outgoing password-reset mail). [`InMemoryIdentityProvider`] is a client bound
//! to one session context; several stores sharing one client behave like tabs
//! sharing browser storage, so a sign-out through one is pushed to the others.
//! [`InMemoryConnector`] builds request-scoped clients for the server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use password_hash::{PasswordHash, SaltString};
use uuid::Uuid;

use tableside_core::UserId;
use tableside_events::{EventBus, InMemoryEventBus, Subscription};

use crate::{
    AccessToken, AuthChangeEvent, AuthChangeKind, IdentityProvider, ProviderConnector, ProviderError,
    ProviderSession, ProviderUser, UserMetadata,
};

const MIN_PROVIDER_PASSWORD_CHARS: usize = 6;

// Cheap parameters: this backend never holds real credentials.
const HASH_MEMORY_KIB: u32 = 1024;
const HASH_ITERATIONS: u32 = 1;

/// A password-reset email the backend "sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetRequest {
    pub email: String,
    pub redirect_to: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Account {
    user: ProviderUser,
    password_hash: String,
}

#[derive(Debug, Clone, Copy)]
struct SessionRecord {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BackendState {
    accounts: HashMap<UserId, Account>,
    by_email: HashMap<String, UserId>,
    sessions: HashMap<String, SessionRecord>,
    resets: Vec<PasswordResetRequest>,
}

/// The hosted side of the in-memory provider.
pub struct InMemoryIdentityBackend {
    state: RwLock<BackendState>,
    available: AtomicBool,
    session_ttl: Duration,
    hasher: Argon2<'static>,
}

impl Default for InMemoryIdentityBackend {
    fn default() -> Self {
        let params = Params::new(HASH_MEMORY_KIB, HASH_ITERATIONS, 1, None).unwrap_or_default();
        Self {
            state: RwLock::new(BackendState::default()),
            available: AtomicBool::new(true),
            session_ttl: Duration::hours(1),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl InMemoryIdentityBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`ProviderError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Password-reset emails dispatched so far, oldest first.
    pub fn password_resets(&self) -> Vec<PasswordResetRequest> {
        self.state.read().map(|s| s.resets.clone()).unwrap_or_default()
    }

    /// Number of live (unexpired) sessions.
    pub fn active_sessions(&self) -> usize {
        let now = Utc::now();
        self.state
            .read()
            .map(|s| s.sessions.values().filter(|r| r.expires_at > now).count())
            .unwrap_or(0)
    }

    /// Invalidate every session of a user (administrative sign-out).
    pub fn revoke_user_sessions(&self, user_id: UserId) {
        if let Ok(mut state) = self.state.write() {
            state.sessions.retain(|_, r| r.user_id != user_id);
        }
    }

    fn ensure_available(&self) -> Result<(), ProviderError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::Unavailable("identity service is not reachable".to_string()))
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BackendState>, ProviderError> {
        self.state.read().map_err(|_| ProviderError::Other("backend lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BackendState>, ProviderError> {
        self.state.write().map_err(|_| ProviderError::Other("backend lock poisoned".to_string()))
    }

    fn hash_password(&self, password: &str) -> Result<String, ProviderError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| ProviderError::Other(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| ProviderError::Other(e.to_string()))?;
        let phc = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        Ok(phc.to_string())
    }

    fn verify_password(&self, hash: &str, password: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| self.hasher.verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }

    fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<ProviderUser, ProviderError> {
        check_password_strength(password)?;
        let key = normalize_email(email);
        if self.read()?.by_email.contains_key(&key) {
            return Err(ProviderError::EmailAlreadyRegistered);
        }

        let password_hash = self.hash_password(password)?;
        let user = ProviderUser {
            id: UserId::new(),
            email: key.clone(),
            metadata,
            created_at: Utc::now(),
        };

        let mut state = self.write()?;
        // Re-check under the write lock; hashing happened unlocked.
        if state.by_email.contains_key(&key) {
            return Err(ProviderError::EmailAlreadyRegistered);
        }
        state.by_email.insert(key, user.id);
        state.accounts.insert(user.id, Account { user: user.clone(), password_hash });
        Ok(user)
    }

    fn verify_credentials(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let account = {
            let state = self.read()?;
            state
                .by_email
                .get(&normalize_email(email))
                .and_then(|id| state.accounts.get(id))
                .cloned()
                .ok_or(ProviderError::InvalidCredentials)?
        };

        if self.verify_password(&account.password_hash, password) {
            Ok(account.user)
        } else {
            Err(ProviderError::InvalidCredentials)
        }
    }

    fn issue_session(&self, user: ProviderUser) -> Result<ProviderSession, ProviderError> {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + self.session_ttl;
        self.write()?
            .sessions
            .insert(token.clone(), SessionRecord { user_id: user.id, expires_at });
        Ok(ProviderSession {
            access_token: AccessToken::new(token),
            user,
            expires_at,
        })
    }

    fn revoke_session(&self, token: &AccessToken) -> Result<(), ProviderError> {
        self.write()?.sessions.remove(token.as_str());
        Ok(())
    }

    fn session_for(&self, token: &AccessToken) -> Result<ProviderSession, ProviderError> {
        let state = self.read()?;
        let record = state
            .sessions
            .get(token.as_str())
            .filter(|r| r.expires_at > Utc::now())
            .ok_or(ProviderError::InvalidToken)?;
        let account = state.accounts.get(&record.user_id).ok_or(ProviderError::InvalidToken)?;
        Ok(ProviderSession {
            access_token: token.clone(),
            user: account.user.clone(),
            expires_at: record.expires_at,
        })
    }

    fn set_password(&self, user_id: UserId, password: &str) -> Result<(), ProviderError> {
        check_password_strength(password)?;
        let password_hash = self.hash_password(password)?;
        let mut state = self.write()?;
        let account = state.accounts.get_mut(&user_id).ok_or(ProviderError::InvalidToken)?;
        account.password_hash = password_hash;
        Ok(())
    }

    fn record_reset(&self, email: &str, redirect_to: &str) -> Result<(), ProviderError> {
        let key = normalize_email(email);
        let mut state = self.write()?;
        // Unknown addresses succeed silently so callers can't probe for accounts.
        if state.by_email.contains_key(&key) {
            state.resets.push(PasswordResetRequest {
                email: key,
                redirect_to: redirect_to.to_string(),
                requested_at: Utc::now(),
            });
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_strength(password: &str) -> Result<(), ProviderError> {
    if password.chars().count() < MIN_PROVIDER_PASSWORD_CHARS {
        return Err(ProviderError::WeakPassword(
            "Password should be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

/// Client handle bound to one session context.
pub struct InMemoryIdentityProvider {
    backend: Arc<InMemoryIdentityBackend>,
    token: RwLock<Option<AccessToken>>,
    events: InMemoryEventBus<AuthChangeEvent>,
}

impl InMemoryIdentityProvider {
    pub fn new(backend: Arc<InMemoryIdentityBackend>) -> Self {
        Self::with_token(backend, None)
    }

    pub fn with_token(backend: Arc<InMemoryIdentityBackend>, token: Option<AccessToken>) -> Self {
        Self {
            backend,
            token: RwLock::new(token),
            events: InMemoryEventBus::new(),
        }
    }

    pub fn backend(&self) -> &Arc<InMemoryIdentityBackend> {
        &self.backend
    }

    /// Exchange the bound token for a fresh one and notify subscribers.
    pub fn refresh_session(&self) -> Result<ProviderSession, ProviderError> {
        self.backend.ensure_available()?;
        let old = self.bound_token().ok_or(ProviderError::NoSession)?;
        let current = self.backend.session_for(&old)?;
        let fresh = self.backend.issue_session(current.user)?;
        self.backend.revoke_session(&old)?;
        self.bind(Some(fresh.access_token.clone()));
        self.emit(AuthChangeEvent {
            kind: AuthChangeKind::TokenRefreshed,
            session: Some(fresh.clone()),
        });
        Ok(fresh)
    }

    fn bound_token(&self) -> Option<AccessToken> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn bind(&self, token: Option<AccessToken>) -> Option<AccessToken> {
        match self.token.write() {
            Ok(mut slot) => std::mem::replace(&mut *slot, token),
            Err(_) => None,
        }
    }

    fn emit(&self, event: AuthChangeEvent) {
        if let Err(e) = self.events.publish(event) {
            tracing::warn!(error = ?e, "failed to publish auth change event");
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: UserMetadata,
    ) -> Result<ProviderSession, ProviderError> {
        self.backend.ensure_available()?;
        let user = self.backend.create_account(email, password, metadata)?;
        let session = self.backend.issue_session(user)?;
        self.bind(Some(session.access_token.clone()));
        self.emit(AuthChangeEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, ProviderError> {
        self.backend.ensure_available()?;
        let user = self.backend.verify_credentials(email, password)?;
        let session = self.backend.issue_session(user)?;
        if let Some(previous) = self.bind(Some(session.access_token.clone())) {
            self.backend.revoke_session(&previous)?;
        }
        self.emit(AuthChangeEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        // The local session is dropped even when the remote call fails.
        let Some(token) = self.bind(None) else {
            return Ok(());
        };
        self.emit(AuthChangeEvent::signed_out());
        self.backend.ensure_available()?;
        self.backend.revoke_session(&token)
    }

    async fn current_user(&self) -> Result<Option<ProviderUser>, ProviderError> {
        self.backend.ensure_available()?;
        match self.bound_token() {
            Some(token) => self.backend.session_for(&token).map(|s| Some(s.user)),
            None => Ok(None),
        }
    }

    fn session(&self) -> Option<ProviderSession> {
        self.bound_token().and_then(|t| self.backend.session_for(&t).ok())
    }

    fn subscribe(&self) -> Subscription<AuthChangeEvent> {
        self.events.subscribe()
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<(), ProviderError> {
        self.backend.ensure_available()?;
        self.backend.record_reset(email, redirect_to)
    }

    async fn update_password(&self, password: &str) -> Result<(), ProviderError> {
        self.backend.ensure_available()?;
        let token = self.bound_token().ok_or(ProviderError::NoSession)?;
        let session = self.backend.session_for(&token)?;
        self.backend.set_password(session.user.id, password)?;
        self.emit(AuthChangeEvent {
            kind: AuthChangeKind::UserUpdated,
            session: Some(session),
        });
        Ok(())
    }
}

/// Builds a fresh, request-scoped client per call.
#[derive(Clone)]
pub struct InMemoryConnector {
    backend: Arc<InMemoryIdentityBackend>,
}

impl InMemoryConnector {
    pub fn new(backend: Arc<InMemoryIdentityBackend>) -> Self {
        Self { backend }
    }
}

impl ProviderConnector for InMemoryConnector {
    fn connect(&self, credentials: Option<AccessToken>) -> Arc<dyn IdentityProvider> {
        Arc::new(InMemoryIdentityProvider::with_token(self.backend.clone(), credentials))
    }
}
