//! Postgres-backed profile store.
//!
//! Maps onto the `users` table (see `migrations/0001_users.sql`). The primary
//! key is the provider-issued user id, so a retried registration insert is
//! reported as [`ProfileStoreError::Duplicate`] rather than creating a second row.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use tableside_auth::Role;
use tableside_core::{RestaurantId, UserId};

use crate::{ProfileStore, ProfileStoreError, UserProfile};

const SCHEMA: &str = include_str!("../migrations/0001_users.sql");

pub struct PostgresProfileStore {
    pool: Arc<PgPool>,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Create the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), ProfileStoreError> {
        sqlx::raw_sql(SCHEMA).execute(&*self.pool).await.map_err(store_error)?;
        Ok(())
    }
}

fn store_error(err: sqlx::Error) -> ProfileStoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => ProfileStoreError::Duplicate,
        _ => ProfileStoreError::Unavailable(err.to_string()),
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn insert(&self, profile: UserProfile) -> Result<(), ProfileStoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, restaurant_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(profile.role.as_str())
        .bind(profile.restaurant_id.map(uuid::Uuid::from))
        .bind(profile.created_at)
        .execute(&*self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, restaurant_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let corrupt = |e: sqlx::Error| ProfileStoreError::Corrupt(e.to_string());
        let role: String = row.try_get("role").map_err(corrupt)?;
        let role: Role = role.parse().map_err(|e: tableside_auth::UnknownRole| ProfileStoreError::Corrupt(e.to_string()))?;
        let restaurant_id: Option<uuid::Uuid> = row.try_get("restaurant_id").map_err(corrupt)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(corrupt)?;

        Ok(Some(UserProfile {
            id: UserId::from_uuid(row.try_get("id").map_err(corrupt)?),
            email: row.try_get("email").map_err(corrupt)?,
            name: row.try_get("name").map_err(corrupt)?,
            role,
            restaurant_id: restaurant_id.map(RestaurantId::from_uuid),
            created_at,
        }))
    }
}
