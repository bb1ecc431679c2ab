//! Role Model

use serde::{Deserialize, Serialize};

/// Role entity (RBAC 角色)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub is_active: bool,
}

/// Create role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<RolePermissionInput>,
}

/// Update role payload
///
/// Permissions are edited separately through the replace-all endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// One grant in a role permission edit: "this action on this screen"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermissionInput {
    pub screen_id: i64,
    pub screen_action_id: i64,
}

/// Replace-all payload for a role's grants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolePermissionsReplace {
    pub permissions: Vec<RolePermissionInput>,
}

/// RolePermission join row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RolePermission {
    pub role_id: i64,
    pub screen_id: i64,
    pub screen_action_id: i64,
}

/// RolePermission row joined with catalog names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RolePermissionDetail {
    pub screen_id: i64,
    pub screen_name: String,
    pub screen_action_id: i64,
    pub action_name: String,
}
