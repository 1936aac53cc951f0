//! `tableside-identity` — the identity provider boundary and the session service.
//!
//! - [`provider`]: the capability set the core needs from an external identity provider
//! - [`profile`]: the tenant-user profile store (insert on registration, lookup by id)
//! - [`in_memory`]: a self-contained provider for dev/test
//! - [`service`]: [`SessionService`], the only component that talks to both

pub mod error;
pub mod in_memory;
pub mod profile;
pub mod provider;
pub mod service;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::PostgresProfileStore;

pub use error::{AuthError, ProfileStoreError, ProviderError};
pub use in_memory::{InMemoryConnector, InMemoryIdentityBackend, InMemoryIdentityProvider, PasswordResetRequest};
pub use profile::{InMemoryProfileStore, ProfileStore, UserProfile};
pub use provider::{
    AccessToken, AuthChangeEvent, AuthChangeKind, IdentityProvider, ProviderConnector, ProviderSession,
    ProviderUser, UserMetadata,
};
pub use service::SessionService;
