//! User Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::User;
use shared::pagination::PageQuery;
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT u.id, u.username, u.role_id, r.name AS role_name, u.is_active, u.created_at \
     FROM app_user u LEFT JOIN role r ON r.id = u.role_id";

/// Row used by login only; never leaves the server
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.username = ? LIMIT 1"))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_credentials(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Option<UserCredentials>> {
    let row = sqlx::query_as::<_, UserCredentials>(
        "SELECT id, username, password_hash, is_active FROM app_user WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// One page of users ordered by username, with the total match count.
///
/// `search` matches anywhere in the username, ignoring ASCII case.
pub async fn find_page(pool: &SqlitePool, query: &PageQuery) -> RepoResult<(Vec<User>, u64)> {
    let pattern = query.search_term().map(|s| format!("%{}%", escape_like(s)));

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM app_user u WHERE (?1 IS NULL OR u.username LIKE ?1 ESCAPE '\\')",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let users = sqlx::query_as::<_, User>(&format!(
        "{USER_SELECT} WHERE (?1 IS NULL OR u.username LIKE ?1 ESCAPE '\\') \
         ORDER BY u.username LIMIT ?2 OFFSET ?3"
    ))
    .bind(&pattern)
    .bind(i64::from(query.limit()))
    .bind(query.offset())
    .fetch_all(pool)
    .await?;

    Ok((users, total.max(0) as u64))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn require(pool: &SqlitePool, id: i64) -> RepoResult<User> {
    find_by_id(pool, id).await?.ok_or_else(|| {
        RepoError::Business(ErrorCode::UserNotFound, format!("User {id} not found"))
    })
}

async fn ensure_role_exists(pool: &SqlitePool, role_id: i64) -> RepoResult<()> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM role WHERE id = ?")
        .bind(role_id)
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(RepoError::Business(
            ErrorCode::RoleNotFound,
            format!("Role {role_id} not found"),
        ));
    }
    Ok(())
}

fn username_taken(username: &str) -> RepoError {
    RepoError::Business(
        ErrorCode::UserNameExists,
        format!("Username '{username}' already exists"),
    )
}

/// Insert a user with an already-hashed password
pub async fn create(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    role_id: Option<i64>,
) -> RepoResult<User> {
    if let Some(role_id) = role_id {
        ensure_role_exists(pool, role_id).await?;
    }

    let username = username.trim();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO app_user (username, password_hash, role_id, is_active, created_at) VALUES (?, ?, ?, 1, ?) RETURNING id",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role_id)
    .bind(shared::util::now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => username_taken(username),
        other => other,
    })?;

    require(pool, id).await
}

/// Fields to change on a user; `None` leaves the column as is
#[derive(Debug, Default)]
pub struct UserChanges<'a> {
    pub username: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    /// `Some(None)` unassigns the role
    pub role_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

pub async fn update(pool: &SqlitePool, id: i64, changes: UserChanges<'_>) -> RepoResult<User> {
    require(pool, id).await?;
    if let Some(Some(role_id)) = changes.role_id {
        ensure_role_exists(pool, role_id).await?;
    }

    let username = changes.username.map(str::trim);
    sqlx::query(
        "UPDATE app_user SET username = COALESCE(?1, username), password_hash = COALESCE(?2, password_hash), \
         role_id = CASE WHEN ?3 THEN ?4 ELSE role_id END, is_active = COALESCE(?5, is_active) WHERE id = ?6",
    )
    .bind(username)
    .bind(changes.password_hash)
    .bind(changes.role_id.is_some())
    .bind(changes.role_id.flatten())
    .bind(changes.is_active)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => username_taken(username.unwrap_or_default()),
        other => other,
    })?;

    require(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    require(pool, id).await?;
    let result = sqlx::query("DELETE FROM app_user WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
