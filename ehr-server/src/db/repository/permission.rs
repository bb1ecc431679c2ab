//! RolePermission Repository
//!
//! Grants of (screen, action) to roles, and the effective-permission query
//! the authorization gate runs on every request.

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{PermissionPair, RolePermissionDetail, RolePermissionInput};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Effective (screen, action) pairs for a user, restricted to active user,
/// role, screen and action. Unknown users yield an empty list.
pub async fn find_effective_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> RepoResult<Vec<PermissionPair>> {
    let pairs = sqlx::query_as::<_, PermissionPair>(
        "SELECT DISTINCT s.name AS screen, a.name AS action \
         FROM app_user u \
         JOIN role r ON r.id = u.role_id \
         JOIN role_permission rp ON rp.role_id = r.id \
         JOIN screen s ON s.id = rp.screen_id \
         JOIN screen_action a ON a.id = rp.screen_action_id AND a.screen_id = s.id \
         WHERE u.id = ? AND u.is_active = 1 AND r.is_active = 1 \
           AND s.is_active = 1 AND a.is_active = 1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(pairs)
}

/// Grants of one role joined with catalog names
pub async fn find_by_role(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<RolePermissionDetail>> {
    let rows = sqlx::query_as::<_, RolePermissionDetail>(
        "SELECT rp.screen_id, s.name AS screen_name, rp.screen_action_id, a.name AS action_name \
         FROM role_permission rp \
         JOIN screen s ON s.id = rp.screen_id \
         JOIN screen_action a ON a.id = rp.screen_action_id \
         WHERE rp.role_id = ? \
         ORDER BY rp.screen_id, rp.screen_action_id",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Pairs a role grants through active catalog entries.
///
/// The role's own active flag is ignored, so a deactivated role still counts
/// as holding what it would grant once reactivated.
pub async fn find_active_pairs_for_role(
    pool: &SqlitePool,
    role_id: i64,
) -> RepoResult<Vec<PermissionPair>> {
    let pairs = sqlx::query_as::<_, PermissionPair>(
        "SELECT DISTINCT s.name AS screen, a.name AS action \
         FROM role_permission rp \
         JOIN screen s ON s.id = rp.screen_id \
         JOIN screen_action a ON a.id = rp.screen_action_id AND a.screen_id = s.id \
         WHERE rp.role_id = ? AND s.is_active = 1 AND a.is_active = 1",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(pairs)
}

/// Every active (screen, action) pair in the catalog
pub async fn find_active_catalog(pool: &SqlitePool) -> RepoResult<Vec<PermissionPair>> {
    let pairs = sqlx::query_as::<_, PermissionPair>(
        "SELECT s.name AS screen, a.name AS action \
         FROM screen_action a JOIN screen s ON s.id = a.screen_id \
         WHERE s.is_active = 1 AND a.is_active = 1",
    )
    .fetch_all(pool)
    .await?;
    Ok(pairs)
}

/// Insert grants inside an open transaction; repeated triples are ignored
pub(crate) async fn insert_grants(
    tx: &mut Transaction<'_, Sqlite>,
    role_id: i64,
    grants: &[RolePermissionInput],
) -> RepoResult<u64> {
    let mut inserted = 0;
    for grant in grants {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO role_permission (role_id, screen_id, screen_action_id) VALUES (?, ?, ?)",
        )
        .bind(role_id)
        .bind(grant.screen_id)
        .bind(grant.screen_action_id)
        .execute(&mut **tx)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Replace every grant of a role as one batch. System roles are refused.
///
/// Delete-all and insert-new run in a single transaction, so concurrent
/// readers see either the old set or the new one. Returns the number of
/// grants stored.
pub async fn replace_for_role(
    pool: &SqlitePool,
    role_id: i64,
    grants: &[RolePermissionInput],
) -> RepoResult<u64> {
    let mut tx = pool.begin().await?;

    let is_system = sqlx::query_scalar::<_, bool>("SELECT is_system FROM role WHERE id = ?")
        .bind(role_id)
        .fetch_optional(&mut *tx)
        .await?;
    match is_system {
        None => {
            return Err(RepoError::Business(
                ErrorCode::RoleNotFound,
                format!("Role {role_id} not found"),
            ));
        }
        Some(true) => {
            return Err(RepoError::Business(
                ErrorCode::RoleIsSystem,
                "Cannot modify system role".into(),
            ));
        }
        Some(false) => {}
    }

    sqlx::query("DELETE FROM role_permission WHERE role_id = ?")
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

    let inserted = insert_grants(&mut tx, role_id, grants).await?;

    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{role, test_pool, user};
    use crate::db::seed;
    use shared::models::RoleCreate;

    async fn grant_input(pool: &SqlitePool, screen: &str, action: &str) -> RolePermissionInput {
        let (screen_id, screen_action_id) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT s.id, a.id FROM screen_action a JOIN screen s ON s.id = a.screen_id WHERE s.name = ? AND a.name = ?",
        )
        .bind(screen)
        .bind(action)
        .fetch_one(pool)
        .await
        .unwrap();
        RolePermissionInput {
            screen_id,
            screen_action_id,
        }
    }

    /// Seeded catalog, a "Nurse" role with Patients-View, and a user holding it
    async fn nurse_fixture(pool: &SqlitePool) -> (i64, i64) {
        seed::seed_catalog(pool).await.unwrap();
        let view = grant_input(pool, "Patients", "View").await;
        let nurse = role::create(
            pool,
            &RoleCreate {
                name: "Nurse".into(),
                description: None,
                permissions: vec![],
            },
            &[view],
        )
        .await
        .unwrap();
        let u = user::create(pool, "nina", "$argon2id$stub", Some(nurse.id))
            .await
            .unwrap();
        (nurse.id, u.id)
    }

    #[tokio::test]
    async fn test_effective_for_user() {
        let pool = test_pool().await;
        let (_, user_id) = nurse_fixture(&pool).await;

        let pairs = find_effective_for_user(&pool, user_id).await.unwrap();
        assert_eq!(pairs, vec![PermissionPair::new("Patients", "View")]);
    }

    #[tokio::test]
    async fn test_unknown_user_has_nothing() {
        let pool = test_pool().await;
        nurse_fixture(&pool).await;
        assert!(find_effective_for_user(&pool, 4242).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_role_grants_nothing() {
        let pool = test_pool().await;
        let (role_id, user_id) = nurse_fixture(&pool).await;

        sqlx::query("UPDATE role SET is_active = 0 WHERE id = ?")
            .bind(role_id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(find_effective_for_user(&pool, user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_user_and_action_grant_nothing() {
        let pool = test_pool().await;
        let (_, user_id) = nurse_fixture(&pool).await;

        sqlx::query("UPDATE screen_action SET is_active = 0 WHERE name = 'View'")
            .execute(&pool)
            .await
            .unwrap();
        assert!(find_effective_for_user(&pool, user_id).await.unwrap().is_empty());

        sqlx::query("UPDATE screen_action SET is_active = 1")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("UPDATE app_user SET is_active = 0 WHERE id = ?")
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();
        assert!(find_effective_for_user(&pool, user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_pairs_skip_inactive_catalog_but_not_inactive_role() {
        let pool = test_pool().await;
        let (role_id, _) = nurse_fixture(&pool).await;
        let export = grant_input(&pool, "Reports", "Export").await;
        let view = grant_input(&pool, "Patients", "View").await;
        replace_for_role(&pool, role_id, &[view, export]).await.unwrap();

        sqlx::query(
            "UPDATE screen_action SET is_active = 0 WHERE name = 'Export' \
             AND screen_id = (SELECT id FROM screen WHERE name = 'Reports')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("UPDATE role SET is_active = 0 WHERE id = ?")
            .bind(role_id)
            .execute(&pool)
            .await
            .unwrap();

        let pairs = find_active_pairs_for_role(&pool, role_id).await.unwrap();
        assert_eq!(pairs, vec![PermissionPair::new("Patients", "View")]);
        assert_eq!(find_by_role(&pool, role_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_active_catalog() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();
        assert_eq!(find_active_catalog(&pool).await.unwrap().len(), 25);

        sqlx::query("UPDATE screen SET is_active = 0 WHERE name = 'Reports'")
            .execute(&pool)
            .await
            .unwrap();
        let pairs = find_active_catalog(&pool).await.unwrap();
        assert_eq!(pairs.len(), 20);
        assert!(!pairs.contains(&PermissionPair::new("Reports", "View")));
    }

    #[tokio::test]
    async fn test_replace_removes_old_grants() {
        let pool = test_pool().await;
        let (role_id, user_id) = nurse_fixture(&pool).await;
        let edit = grant_input(&pool, "Encounters", "Edit").await;

        let stored = replace_for_role(&pool, role_id, &[edit]).await.unwrap();
        assert_eq!(stored, 1);

        let pairs = find_effective_for_user(&pool, user_id).await.unwrap();
        assert_eq!(pairs, vec![PermissionPair::new("Encounters", "Edit")]);
    }

    #[tokio::test]
    async fn test_replace_with_duplicates_stores_once() {
        let pool = test_pool().await;
        let (role_id, _) = nurse_fixture(&pool).await;
        let view = grant_input(&pool, "Patients", "View").await;

        let stored = replace_for_role(&pool, role_id, &[view, view, view])
            .await
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(find_by_role(&pool, role_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_with_empty_clears() {
        let pool = test_pool().await;
        let (role_id, user_id) = nurse_fixture(&pool).await;

        replace_for_role(&pool, role_id, &[]).await.unwrap();
        assert!(find_by_role(&pool, role_id).await.unwrap().is_empty());
        assert!(find_effective_for_user(&pool, user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_system_role_refused() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();
        let admin_id = seed::ensure_admin_role(&pool).await.unwrap();

        let err = replace_for_role(&pool, admin_id, &[]).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RoleIsSystem, _)));
        assert_eq!(find_by_role(&pool, admin_id).await.unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_replace_unknown_role() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();

        let err = replace_for_role(&pool, 777, &[]).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RoleNotFound, _)));
    }
}
