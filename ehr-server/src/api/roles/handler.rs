//! Role API Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::screen::{self, ResolvedGrant};
use crate::db::repository::{permission, role};
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};
use shared::models::{
    EffectivePermissions, Role, RoleCreate, RolePermissionDetail, RolePermissionInput,
    RolePermissionsReplace, RoleUpdate,
};

/// 权限天花板校验：操作者只能分配自己拥有的权限
///
/// Grants of inactive catalog entries confer nothing and are not checked.
fn validate_permission_ceiling(
    current_user: &CurrentUser,
    caller_permissions: &EffectivePermissions,
    grants: &[ResolvedGrant],
) -> AppResult<()> {
    for grant in grants.iter().filter(|g| g.active) {
        if !caller_permissions.contains(&grant.pair) {
            security_log!(
                "WARN",
                "grant_above_ceiling",
                user_id = current_user.id,
                username = current_user.username.clone(),
                permission = grant.pair.to_string()
            );
            return Err(AppError::forbidden(format!(
                "Cannot grant permission '{}': you do not have it yourself",
                grant.pair
            )));
        }
    }
    Ok(())
}

/// Check grant inputs against the catalog and the caller's own permissions
async fn resolve_and_check(
    state: &ServerState,
    current_user: &CurrentUser,
    caller_permissions: &EffectivePermissions,
    inputs: &[RolePermissionInput],
) -> AppResult<Vec<RolePermissionInput>> {
    let grants = screen::resolve_grants(&state.pool, inputs).await?;
    validate_permission_ceiling(current_user, caller_permissions, &grants)?;
    Ok(grants.into_iter().map(|g| g.input).collect())
}

/// Query filter for role listing
#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    /// If true, return all roles (including inactive)
    all: Option<bool>,
}

/// GET /api/roles - Get all roles
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<RoleQuery>,
) -> AppResult<ApiResponse<Vec<Role>>> {
    let roles = if query.all.unwrap_or(false) {
        role::find_all_with_inactive(&state.pool).await
    } else {
        role::find_all(&state.pool).await
    }?;

    Ok(ok(roles))
}

/// GET /api/roles/{id} - Get role by ID
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Role>> {
    let role = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::RoleNotFound, format!("Role {id} not found")))?;

    Ok(ok(role))
}

/// GET /api/roles/{id}/permissions - Grants of a role with catalog names
pub async fn get_role_permissions(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Vec<RolePermissionDetail>>> {
    if role::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::RoleNotFound,
            format!("Role {id} not found"),
        ));
    }

    let permissions = permission::find_by_role(&state.pool, id).await?;
    Ok(ok(permissions))
}

/// POST /api/roles - Create a new role with optional initial grants
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Extension(caller_permissions): Extension<EffectivePermissions>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<ApiResponse<Role>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_name = %payload.name,
        "Creating role"
    );

    let grants =
        resolve_and_check(&state, &current_user, &caller_permissions, &payload.permissions).await?;
    let r = role::create(&state.pool, &payload, &grants).await?;

    Ok(ok(r))
}

/// PUT /api/roles/{id} - Update name, description or active flag
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<ApiResponse<Role>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        "Updating role"
    );

    let r = role::update(&state.pool, id, &payload).await?;
    Ok(ok(r))
}

/// PUT /api/roles/{id}/permissions - Replace all grants of a role
///
/// Takes effect on the next request of every user holding the role.
pub async fn replace_role_permissions(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Extension(caller_permissions): Extension<EffectivePermissions>,
    Path(id): Path<i64>,
    Json(payload): Json<RolePermissionsReplace>,
) -> AppResult<ApiResponse<Vec<RolePermissionDetail>>> {
    let grants =
        resolve_and_check(&state, &current_user, &caller_permissions, &payload.permissions).await?;

    let stored = permission::replace_for_role(&state.pool, id, &grants).await?;

    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        grants = stored,
        "Role permissions replaced"
    );

    let permissions = permission::find_by_role(&state.pool, id).await?;
    Ok(ok(permissions))
}

/// DELETE /api/roles/{id} - Delete a role that no user holds
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<bool>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        "Deleting role"
    );

    let deleted = role::delete(&state.pool, id).await?;
    Ok(ok(deleted))
}
