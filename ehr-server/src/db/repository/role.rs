//! Role Repository

use super::{RepoError, RepoResult, permission};
use shared::error::ErrorCode;
use shared::models::{Role, RoleCreate, RolePermissionInput, RoleUpdate};
use sqlx::SqlitePool;

const ROLE_COLUMNS: &str = "id, name, description, is_system, is_active";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM role WHERE is_active = 1 ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

pub async fn find_all_with_inactive(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM role ORDER BY name"))
        .fetch_all(pool)
        .await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM role WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

async fn require(pool: &SqlitePool, id: i64) -> RepoResult<Role> {
    find_by_id(pool, id).await?.ok_or_else(|| {
        RepoError::Business(ErrorCode::RoleNotFound, format!("Role {id} not found"))
    })
}

fn name_taken(name: &str) -> RepoError {
    RepoError::Business(
        ErrorCode::RoleNameExists,
        format!("Role '{name}' already exists"),
    )
}

/// Insert a role and its initial grants in one transaction.
///
/// `grants` must already be checked against the catalog.
pub async fn create(
    pool: &SqlitePool,
    data: &RoleCreate,
    grants: &[RolePermissionInput],
) -> RepoResult<Role> {
    let name = data.name.trim();
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO role (name, description, is_system, is_active) VALUES (?, ?, 0, 1) RETURNING id",
    )
    .bind(name)
    .bind(&data.description)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => name_taken(name),
        other => other,
    })?;

    permission::insert_grants(&mut tx, id, grants).await?;
    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

/// Update name, description or active flag. System roles are immutable.
pub async fn update(pool: &SqlitePool, id: i64, data: &RoleUpdate) -> RepoResult<Role> {
    let existing = require(pool, id).await?;
    if existing.is_system {
        return Err(RepoError::Business(
            ErrorCode::RoleIsSystem,
            "Cannot modify system role".into(),
        ));
    }

    let name = data.name.as_deref().map(str::trim);
    sqlx::query(
        "UPDATE role SET name = COALESCE(?1, name), description = COALESCE(?2, description), is_active = COALESCE(?3, is_active) WHERE id = ?4",
    )
    .bind(name)
    .bind(&data.description)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => name_taken(name.unwrap_or_default()),
        other => other,
    })?;

    require(pool, id).await
}

/// Number of users currently holding the role
pub async fn count_users(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM app_user WHERE role_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Delete a role and (by cascade) its grants.
///
/// Refused for system roles and for roles still assigned to a user.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let existing = require(pool, id).await?;
    if existing.is_system {
        return Err(RepoError::Business(
            ErrorCode::RoleIsSystem,
            "Cannot delete system role".into(),
        ));
    }

    let in_use = count_users(pool, id).await?;
    if in_use > 0 {
        return Err(RepoError::Business(
            ErrorCode::RoleInUse,
            format!("Role '{}' is assigned to {in_use} user(s)", existing.name),
        ));
    }

    let result = sqlx::query("DELETE FROM role WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
