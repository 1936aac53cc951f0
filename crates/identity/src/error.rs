//! Error taxonomy of the identity boundary.

use thiserror::Error;

use tableside_core::DomainError;

/// Failure reported by an identity provider adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("session token is invalid or expired")]
    InvalidToken,

    #[error("email already registered")]
    EmailAlreadyRegistered,

    #[error("weak password: {0}")]
    WeakPassword(String),

    #[error("no active session")]
    NoSession,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider error: {0}")]
    Other(String),
}

/// Failure reported by the tenant-user profile store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileStoreError {
    #[error("profile already exists")]
    Duplicate,

    #[error("profile store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt profile row: {0}")]
    Corrupt(String),
}

/// Typed failure of a session operation.
///
/// `Display` is the human-readable text shown next to the form that triggered
/// the operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Authentication service unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider knows the principal but the profile join failed.
    #[error("User profile not found")]
    ProfileNotFound,

    /// Input rejected before the provider was contacted.
    #[error("{0}")]
    Validation(String),

    #[error("User already registered")]
    EmailAlreadyRegistered,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{0}")]
    Unknown(String),
}

impl AuthError {
    /// Message surfaced verbatim into the session's `error` field.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<ProviderError> for AuthError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::InvalidCredentials | ProviderError::InvalidToken => AuthError::InvalidCredentials,
            ProviderError::EmailAlreadyRegistered => AuthError::EmailAlreadyRegistered,
            ProviderError::WeakPassword(msg) => AuthError::Validation(msg),
            ProviderError::NoSession => AuthError::NotAuthenticated,
            ProviderError::Unavailable(msg) => AuthError::ProviderUnavailable(msg),
            ProviderError::Other(msg) => AuthError::Unknown(msg),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => AuthError::Validation(msg),
            other => AuthError::Unknown(other.to_string()),
        }
    }
}
