//! Screen / ScreenAction Repository
//!
//! The catalog is seeded at startup and read-only over HTTP.

use std::collections::HashSet;

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{PermissionPair, RolePermissionInput, Screen, ScreenAction, ScreenWithActions};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Screen>> {
    let screens =
        sqlx::query_as::<_, Screen>("SELECT id, name, is_active FROM screen ORDER BY id")
            .fetch_all(pool)
            .await?;
    Ok(screens)
}

pub async fn find_actions(pool: &SqlitePool) -> RepoResult<Vec<ScreenAction>> {
    let actions = sqlx::query_as::<_, ScreenAction>(
        "SELECT id, screen_id, name, is_active FROM screen_action ORDER BY screen_id, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(actions)
}

/// Screens with their actions; inactive entries only when `include_inactive`
pub async fn find_all_with_actions(
    pool: &SqlitePool,
    include_inactive: bool,
) -> RepoResult<Vec<ScreenWithActions>> {
    let screens = find_all(pool).await?;
    let actions = find_actions(pool).await?;

    let catalog = screens
        .into_iter()
        .filter(|s| include_inactive || s.is_active)
        .map(|screen| {
            let actions = actions
                .iter()
                .filter(|a| a.screen_id == screen.id && (include_inactive || a.is_active))
                .cloned()
                .collect();
            ScreenWithActions { screen, actions }
        })
        .collect();
    Ok(catalog)
}

/// A grant input checked against the catalog, with the names it stands for
#[derive(Debug, Clone)]
pub struct ResolvedGrant {
    pub input: RolePermissionInput,
    pub pair: PermissionPair,
    /// Both the screen and the action are active
    pub active: bool,
}

/// Check each (screen_id, screen_action_id) against the catalog.
///
/// Duplicates are dropped, first occurrence wins. Fails on the first input
/// whose action is unknown or belongs to a different screen.
pub async fn resolve_grants(
    pool: &SqlitePool,
    inputs: &[RolePermissionInput],
) -> RepoResult<Vec<ResolvedGrant>> {
    let mut seen = HashSet::with_capacity(inputs.len());
    let mut resolved = Vec::with_capacity(inputs.len());

    for input in inputs {
        if !seen.insert(*input) {
            continue;
        }

        let row = sqlx::query_as::<_, (i64, String, String, bool)>(
            "SELECT a.screen_id, s.name, a.name, s.is_active AND a.is_active \
             FROM screen_action a JOIN screen s ON s.id = a.screen_id WHERE a.id = ?",
        )
        .bind(input.screen_action_id)
        .fetch_optional(pool)
        .await?;

        let Some((screen_id, screen_name, action_name, active)) = row else {
            return Err(RepoError::Business(
                ErrorCode::ScreenActionNotFound,
                format!("Screen action {} not found", input.screen_action_id),
            ));
        };

        if screen_id != input.screen_id {
            return Err(RepoError::Business(
                ErrorCode::ActionScreenMismatch,
                format!(
                    "Action {} ({}) does not belong to screen {}",
                    input.screen_action_id, action_name, input.screen_id
                ),
            ));
        }

        resolved.push(ResolvedGrant {
            input: *input,
            pair: PermissionPair::new(screen_name, action_name),
            active,
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_pool;
    use crate::db::seed;

    async fn action_id(pool: &SqlitePool, screen: &str, action: &str) -> (i64, i64) {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT s.id, a.id FROM screen_action a JOIN screen s ON s.id = a.screen_id WHERE s.name = ? AND a.name = ?",
        )
        .bind(screen)
        .bind(action)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_catalog_listing() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();

        let catalog = find_all_with_actions(&pool, false).await.unwrap();
        assert_eq!(catalog.len(), 6);

        let reports = catalog
            .iter()
            .find(|s| s.screen.name == "Reports")
            .unwrap();
        let names: Vec<&str> = reports.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["View", "Add", "Edit", "Delete", "Export"]);
    }

    #[tokio::test]
    async fn test_inactive_hidden_unless_requested() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();
        sqlx::query("UPDATE screen SET is_active = 0 WHERE name = 'Doctors'")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(find_all_with_actions(&pool, false).await.unwrap().len(), 5);
        assert_eq!(find_all_with_actions(&pool, true).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_resolve_grants_flags_inactive_entries() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();
        let (reports_id, export_id) = action_id(&pool, "Reports", "Export").await;
        let (_, reports_view_id) = action_id(&pool, "Reports", "View").await;
        sqlx::query("UPDATE screen_action SET is_active = 0 WHERE id = ?")
            .bind(export_id)
            .execute(&pool)
            .await
            .unwrap();

        let resolved = resolve_grants(
            &pool,
            &[
                RolePermissionInput {
                    screen_id: reports_id,
                    screen_action_id: export_id,
                },
                RolePermissionInput {
                    screen_id: reports_id,
                    screen_action_id: reports_view_id,
                },
            ],
        )
        .await
        .unwrap();
        assert!(!resolved[0].active);
        assert!(resolved[1].active);

        sqlx::query("UPDATE screen SET is_active = 0 WHERE id = ?")
            .bind(reports_id)
            .execute(&pool)
            .await
            .unwrap();
        let resolved = resolve_grants(
            &pool,
            &[RolePermissionInput {
                screen_id: reports_id,
                screen_action_id: reports_view_id,
            }],
        )
        .await
        .unwrap();
        assert!(!resolved[0].active);
    }

    #[tokio::test]
    async fn test_resolve_grants_dedups_and_names() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();
        let (screen_id, view_id) = action_id(&pool, "Patients", "View").await;
        let input = RolePermissionInput {
            screen_id,
            screen_action_id: view_id,
        };

        let resolved = resolve_grants(&pool, &[input, input, input]).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].pair, PermissionPair::new("patients", "view"));
    }

    #[tokio::test]
    async fn test_resolve_grants_rejects_mismatch_and_unknown() {
        let pool = test_pool().await;
        seed::seed_catalog(&pool).await.unwrap();
        let (patients_id, _) = action_id(&pool, "Patients", "View").await;
        let (_, roles_edit_id) = action_id(&pool, "Roles", "Edit").await;

        let err = resolve_grants(
            &pool,
            &[RolePermissionInput {
                screen_id: patients_id,
                screen_action_id: roles_edit_id,
            }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::ActionScreenMismatch, _)));

        let err = resolve_grants(
            &pool,
            &[RolePermissionInput {
                screen_id: patients_id,
                screen_action_id: 9999,
            }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::ScreenActionNotFound, _)));
    }
}
