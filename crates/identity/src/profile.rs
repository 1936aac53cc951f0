//! Tenant-user profile store.
//!
//! One row per user, keyed by the provider-issued id. The core needs exactly
//! two operations: insert on registration and lookup by id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tableside_auth::Role;
use tableside_core::{RestaurantId, UserId};

use crate::ProfileStoreError;

/// Profile row joined onto the provider principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// `None` until tenant provisioning attaches the user to a restaurant.
    pub restaurant_id: Option<RestaurantId>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn insert(&self, profile: UserProfile) -> Result<(), ProfileStoreError>;

    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, ProfileStoreError>;
}

#[async_trait]
impl<S> ProfileStore for Arc<S>
where
    S: ProfileStore + ?Sized,
{
    async fn insert(&self, profile: UserProfile) -> Result<(), ProfileStoreError> {
        (**self).insert(profile).await
    }

    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        (**self).get(id).await
    }
}

/// In-memory profile store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    inner: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert(&self, profile: UserProfile) -> Result<(), ProfileStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| ProfileStoreError::Unavailable("lock poisoned".to_string()))?;
        if map.contains_key(&profile.id) {
            return Err(ProfileStoreError::Duplicate);
        }
        map.insert(profile.id, profile);
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| ProfileStoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(map.get(&id).cloned())
    }
}
