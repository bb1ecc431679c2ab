//! 启动时的数据初始化
//!
//! Idempotent: every step may run on each boot without duplicating rows or
//! touching data an operator changed (the bootstrap admin's password is never
//! reset once the account exists).

use sqlx::SqlitePool;

use crate::auth::password::hash_password_async;
use crate::auth::permissions::{ADMIN_ROLE, DEFAULT_CATALOG};
use crate::core::Config;
use crate::db::repository::{RepoResult, user};
use crate::utils::AppResult;

/// Run every seeding step
pub async fn run(pool: &SqlitePool, config: &Config) -> AppResult<()> {
    seed_catalog(pool).await?;
    let admin_role_id = ensure_admin_role(pool).await?;

    if let Some((username, password)) = config.bootstrap_admin() {
        if ensure_bootstrap_admin(pool, username, password, admin_role_id).await? {
            tracing::info!(username = %username, "Bootstrap administrator created");
        }
    } else if user::find_page(pool, &Default::default()).await?.1 == 0 {
        tracing::warn!("No users exist and ADMIN_USERNAME/ADMIN_PASSWORD are not set");
    }

    Ok(())
}

/// Ensure every default screen and action exists
pub async fn seed_catalog(pool: &SqlitePool) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    for (screen, actions) in DEFAULT_CATALOG {
        sqlx::query("INSERT OR IGNORE INTO screen (name, is_active) VALUES (?, 1)")
            .bind(*screen)
            .execute(&mut *tx)
            .await?;

        let screen_id = sqlx::query_scalar::<_, i64>("SELECT id FROM screen WHERE name = ?")
            .bind(*screen)
            .fetch_one(&mut *tx)
            .await?;

        for action in *actions {
            sqlx::query(
                "INSERT OR IGNORE INTO screen_action (screen_id, name, is_active) VALUES (?, ?, 1)",
            )
            .bind(screen_id)
            .bind(*action)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    tracing::debug!(screens = DEFAULT_CATALOG.len(), "Permission catalog seeded");
    Ok(())
}

/// Ensure the system administrator role exists, is active, and holds every
/// catalog pair. Returns its id.
pub async fn ensure_admin_role(pool: &SqlitePool) -> RepoResult<i64> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT OR IGNORE INTO role (name, description, is_system, is_active) VALUES (?, ?, 1, 1)",
    )
    .bind(ADMIN_ROLE)
    .bind("Full access to every screen")
    .execute(&mut *tx)
    .await?;

    let role_id = sqlx::query_scalar::<_, i64>("SELECT id FROM role WHERE name = ?")
        .bind(ADMIN_ROLE)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("UPDATE role SET is_system = 1, is_active = 1 WHERE id = ?")
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO role_permission (role_id, screen_id, screen_action_id) \
         SELECT ?, a.screen_id, a.id FROM screen_action a",
    )
    .bind(role_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(role_id)
}

/// Create the bootstrap admin if no user has that name yet.
///
/// Returns `true` when the account was created.
pub async fn ensure_bootstrap_admin(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    role_id: i64,
) -> AppResult<bool> {
    if user::find_by_username(pool, username).await?.is_some() {
        return Ok(false);
    }

    let hash = hash_password_async(password.to_string()).await?;
    user::create(pool, username, &hash, Some(role_id)).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{permission, test_pool};

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let pool = test_pool().await;
        let mut config = Config::default();
        config.admin_username = Some("admin".into());
        config.admin_password = Some("admin-password".into());

        run(&pool, &config).await.unwrap();
        run(&pool, &config).await.unwrap();

        let screens: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM screen")
            .fetch_one(&pool)
            .await
            .unwrap();
        let actions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM screen_action")
            .fetch_one(&pool)
            .await
            .unwrap();
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(screens, 6);
        assert_eq!(actions, 25);
        assert_eq!(users, 1);
    }

    #[tokio::test]
    async fn test_admin_holds_whole_catalog() {
        let pool = test_pool().await;
        let mut config = Config::default();
        config.admin_username = Some("admin".into());
        config.admin_password = Some("admin-password".into());
        run(&pool, &config).await.unwrap();

        let admin = user::find_by_username(&pool, "admin").await.unwrap().unwrap();
        assert_eq!(admin.role_name.as_deref(), Some(ADMIN_ROLE));

        let pairs = permission::find_effective_for_user(&pool, admin.id)
            .await
            .unwrap();
        assert_eq!(pairs.len(), 25);
    }

    #[tokio::test]
    async fn test_existing_admin_password_untouched() {
        let pool = test_pool().await;
        seed_catalog(&pool).await.unwrap();
        let role_id = ensure_admin_role(&pool).await.unwrap();

        assert!(ensure_bootstrap_admin(&pool, "admin", "first-password", role_id).await.unwrap());
        assert!(!ensure_bootstrap_admin(&pool, "ADMIN", "second-password", role_id).await.unwrap());

        let creds = user::find_credentials(&pool, "admin").await.unwrap().unwrap();
        assert!(crate::auth::password::verify_password("first-password", &creds.password_hash).unwrap());
    }
}
