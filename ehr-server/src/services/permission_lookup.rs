//! Permission Lookup Service
//!
//! Resolves the (screen, action) pairs a user's role grants at this moment.
//! The gate depends on the trait only, so tests can swap in a double.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::repository::permission;
use crate::utils::AppResult;
use shared::models::EffectivePermissions;

/// Source of a user's effective permission set.
///
/// Implementations return the empty set for users with no role, an inactive
/// role, an inactive account, or no account at all. Infrastructure failures
/// are errors, never an empty set. No caching: every call reflects the
/// current state of the role tables.
#[async_trait]
pub trait PermissionLookup: Send + Sync {
    async fn effective_permissions(&self, user_id: i64) -> AppResult<EffectivePermissions>;
}

/// SQLite-backed lookup
#[derive(Debug, Clone)]
pub struct SqlitePermissionLookup {
    pool: SqlitePool,
}

impl SqlitePermissionLookup {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionLookup for SqlitePermissionLookup {
    async fn effective_permissions(&self, user_id: i64) -> AppResult<EffectivePermissions> {
        let pairs = permission::find_effective_for_user(&self.pool, user_id).await?;
        Ok(pairs.into_iter().collect())
    }
}
