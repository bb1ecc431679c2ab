//! Permission Definitions and the Authorization Gate
//!
//! ## 设计原则
//! - 权限是 (Screen, Action) 二元组，例如 `("Patients", "View")`
//! - 名称比较不区分大小写
//! - 每次检查都从数据库重新解析有效权限，不缓存
//! - 系统角色 `Administrator` 拥有目录中的全部权限

use std::fmt;

use crate::auth::CurrentUser;
use crate::security_log;
use crate::services::PermissionLookup;
use crate::utils::{AppError, AppResult};
use shared::models::EffectivePermissions;

/// Seeded screen names
pub mod screens {
    pub const PATIENTS: &str = "Patients";
    pub const ENCOUNTERS: &str = "Encounters";
    pub const DOCTORS: &str = "Doctors";
    pub const USERS: &str = "Users";
    pub const ROLES: &str = "Roles";
    pub const REPORTS: &str = "Reports";
}

/// Seeded action names
pub mod actions {
    pub const VIEW: &str = "View";
    pub const ADD: &str = "Add";
    pub const EDIT: &str = "Edit";
    pub const DELETE: &str = "Delete";
    pub const EXPORT: &str = "Export";
}

const CRUD: &[&str] = &[actions::VIEW, actions::ADD, actions::EDIT, actions::DELETE];

/// 默认权限目录：每个 Screen 及其 Actions
pub const DEFAULT_CATALOG: &[(&str, &[&str])] = &[
    (screens::PATIENTS, CRUD),
    (screens::ENCOUNTERS, CRUD),
    (screens::DOCTORS, CRUD),
    (screens::USERS, CRUD),
    (screens::ROLES, CRUD),
    (
        screens::REPORTS,
        &[
            actions::VIEW,
            actions::ADD,
            actions::EDIT,
            actions::DELETE,
            actions::EXPORT,
        ],
    ),
];

/// System role that holds every catalog pair
pub const ADMIN_ROLE: &str = "Administrator";

/// The (screen, action) pair a protected operation declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub screen: &'static str,
    pub action: &'static str,
}

impl PermissionRequirement {
    pub const fn new(screen: &'static str, action: &'static str) -> Self {
        Self { screen, action }
    }

    /// Message returned to callers who lack the pair, spelled as declared
    pub fn denial_message(&self) -> String {
        format!("Access denied. Required permission: {self}")
    }
}

impl fmt::Display for PermissionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.screen, self.action)
    }
}

/// Decide one request.
///
/// 1. 无身份 → `NotAuthenticated` ("Authentication required.")
/// 2. 解析当前有效权限 (lookup errors propagate as system errors)
/// 3. 不匹配 → `PermissionDenied` with the declared pair in the message
///
/// On success the resolved set is returned so callers can reuse it for the
/// permission ceiling check without a second lookup.
pub async fn authorize(
    user: Option<&CurrentUser>,
    requirement: PermissionRequirement,
    lookup: &dyn PermissionLookup,
) -> AppResult<EffectivePermissions> {
    let Some(user) = user else {
        security_log!(
            "WARN",
            "gate_unauthenticated",
            required_permission = requirement.to_string()
        );
        return Err(AppError::not_authenticated());
    };

    let permissions = lookup.effective_permissions(user.id).await?;

    if !permissions.allows(requirement.screen, requirement.action) {
        security_log!(
            "WARN",
            "permission_denied",
            user_id = user.id,
            username = user.username.clone(),
            required_permission = requirement.to_string()
        );
        return Err(AppError::forbidden(requirement.denial_message())
            .with_detail("screen", requirement.screen)
            .with_detail("action", requirement.action));
    }

    Ok(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ErrorCode;
    use async_trait::async_trait;
    use shared::models::PermissionPair;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory lookup keyed by user id
    #[derive(Default)]
    struct FakeLookup {
        grants: HashMap<i64, Vec<PermissionPair>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeLookup {
        fn grant(mut self, user_id: i64, screen: &str, action: &str) -> Self {
            self.grants
                .entry(user_id)
                .or_default()
                .push(PermissionPair::new(screen, action));
            self
        }
    }

    #[async_trait]
    impl PermissionLookup for FakeLookup {
        async fn effective_permissions(&self, user_id: i64) -> AppResult<EffectivePermissions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::database("connection refused"));
            }
            Ok(self
                .grants
                .get(&user_id)
                .map(|pairs| pairs.iter().cloned().collect())
                .unwrap_or_default())
        }
    }

    fn regular_user() -> CurrentUser {
        CurrentUser {
            id: 2,
            username: "RegularUser".to_string(),
        }
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthenticated() {
        let lookup = FakeLookup::default();
        let err = authorize(None, PermissionRequirement::new("Patients", "View"), &lookup)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NotAuthenticated);
        assert_eq!(err.message, "Authentication required.");
        // Lookup is never consulted for anonymous callers
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_granted_pair_allowed_regardless_of_case() {
        let lookup = FakeLookup::default().grant(2, "patients", "view");
        let user = regular_user();

        let perms = authorize(
            Some(&user),
            PermissionRequirement::new("Patients", "View"),
            &lookup,
        )
        .await
        .unwrap();
        assert!(perms.allows("PATIENTS", "VIEW"));
    }

    #[tokio::test]
    async fn test_missing_pair_is_forbidden_with_declared_names() {
        let lookup = FakeLookup::default().grant(2, "patients", "view");
        let user = regular_user();

        let err = authorize(
            Some(&user),
            PermissionRequirement::new("patients", "edit"),
            &lookup,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(
            err.message,
            "Access denied. Required permission: patients - edit"
        );
    }

    #[tokio::test]
    async fn test_user_without_grants_is_forbidden() {
        let lookup = FakeLookup::default().grant(99, "Patients", "View");
        let user = regular_user();

        let err = authorize(
            Some(&user),
            PermissionRequirement::new("Patients", "View"),
            &lookup,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_a_denial() {
        let lookup = FakeLookup {
            fail: true,
            ..FakeLookup::default()
        };
        let user = regular_user();

        let err = authorize(
            Some(&user),
            PermissionRequirement::new("Patients", "View"),
            &lookup,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[tokio::test]
    async fn test_every_check_consults_lookup() {
        let lookup = FakeLookup::default().grant(2, "Patients", "View");
        let user = regular_user();
        let req = PermissionRequirement::new("Patients", "View");

        authorize(Some(&user), req, &lookup).await.unwrap();
        authorize(Some(&user), req, &lookup).await.unwrap();
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_catalog_shape() {
        let pairs: usize = DEFAULT_CATALOG.iter().map(|(_, a)| a.len()).sum();
        assert_eq!(DEFAULT_CATALOG.len(), 6);
        assert_eq!(pairs, 25);
        assert!(
            DEFAULT_CATALOG
                .iter()
                .any(|(s, a)| *s == screens::REPORTS && a.contains(&actions::EXPORT))
        );
    }
}
