//! User API Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};

use crate::auth::CurrentUser;
use crate::auth::password::hash_password_async;
use crate::core::ServerState;
use crate::db::repository::user::{self, UserChanges};
use crate::db::repository::{permission, role};
use crate::security_log;
use crate::utils::validation::{validate_password, validate_username};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};
use shared::models::{EffectivePermissions, PermissionPair, User, UserCreate, UserUpdate};
use shared::pagination::{PageQuery, PaginatedResponse};

/// Active pairs a role stands for. A system role stands for the whole catalog.
async fn pairs_granted_by_role(state: &ServerState, role_id: i64) -> AppResult<Vec<PermissionPair>> {
    let pairs = match role::find_by_id(&state.pool, role_id).await? {
        Some(r) if r.is_system => permission::find_active_catalog(&state.pool).await?,
        _ => permission::find_active_pairs_for_role(&state.pool, role_id).await?,
    };
    Ok(pairs)
}

/// A caller may only hand out a role whose grants they hold themselves
async fn validate_role_ceiling(
    state: &ServerState,
    current_user: &CurrentUser,
    caller_permissions: &EffectivePermissions,
    role_id: i64,
) -> AppResult<()> {
    let granted = pairs_granted_by_role(state, role_id).await?;
    if let Some(missing) = caller_permissions.first_missing(&granted) {
        security_log!(
            "WARN",
            "assign_above_ceiling",
            user_id = current_user.id,
            username = current_user.username.clone(),
            role_id = role_id,
            permission = missing.to_string()
        );
        return Err(AppError::forbidden(format!(
            "Cannot assign role {role_id}: it grants '{missing}' which you do not have"
        )));
    }
    Ok(())
}

/// A caller may only edit or delete an account whose role grants nothing
/// beyond their own permissions
async fn validate_target_ceiling(
    state: &ServerState,
    current_user: &CurrentUser,
    caller_permissions: &EffectivePermissions,
    target_id: i64,
) -> AppResult<()> {
    let target = user::find_by_id(&state.pool, target_id)
        .await?
        .ok_or_else(|| user_not_found(target_id))?;

    // Own account: the caller already holds everything their role grants
    if target.id == current_user.id {
        return Ok(());
    }

    if let Some(role_id) = target.role_id {
        let granted = pairs_granted_by_role(state, role_id).await?;
        if let Some(missing) = caller_permissions.first_missing(&granted) {
            security_log!(
                "WARN",
                "manage_above_ceiling",
                user_id = current_user.id,
                username = current_user.username.clone(),
                target_user_id = target_id,
                permission = missing.to_string()
            );
            return Err(AppError::forbidden(format!(
                "Cannot manage user {target_id}: their role grants '{missing}' which you do not have"
            )));
        }
    }
    Ok(())
}

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}

/// GET /api/users?page=&limit=&search= - Paginated user list
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<PaginatedResponse<User>>> {
    let (users, total) = user::find_page(&state.pool, &query).await?;
    Ok(ok(PaginatedResponse::new(
        users,
        total,
        query.page(),
        query.limit(),
    )))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<User>> {
    let user = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(ok(user))
}

/// POST /api/users - Create a user, optionally with a role
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Extension(caller_permissions): Extension<EffectivePermissions>,
    Json(payload): Json<UserCreate>,
) -> AppResult<ApiResponse<User>> {
    validate_username(payload.username.trim())?;
    validate_password(&payload.password)?;
    if let Some(role_id) = payload.role_id {
        validate_role_ceiling(&state, &current_user, &caller_permissions, role_id).await?;
    }

    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        new_username = %payload.username,
        "Creating user"
    );

    let hash = hash_password_async(payload.password).await?;
    let created = user::create(&state.pool, &payload.username, &hash, payload.role_id).await?;
    Ok(ok(created))
}

/// PUT /api/users/{id} - Update username, password, role or active flag
///
/// `clear_role: true` unassigns the role; it cannot be combined with `role_id`.
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Extension(caller_permissions): Extension<EffectivePermissions>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<ApiResponse<User>> {
    if payload.clear_role && payload.role_id.is_some() {
        return Err(AppError::validation(
            "role_id and clear_role cannot be used together",
        ));
    }
    if let Some(username) = &payload.username {
        validate_username(username.trim())?;
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
    }
    validate_target_ceiling(&state, &current_user, &caller_permissions, id).await?;
    if let Some(role_id) = payload.role_id {
        validate_role_ceiling(&state, &current_user, &caller_permissions, role_id).await?;
    }

    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        target_user_id = %id,
        "Updating user"
    );

    let password_hash = match payload.password {
        Some(password) => Some(hash_password_async(password).await?),
        None => None,
    };

    let updated = user::update(
        &state.pool,
        id,
        UserChanges {
            username: payload.username.as_deref(),
            password_hash: password_hash.as_deref(),
            role_id: if payload.clear_role {
                Some(None)
            } else {
                payload.role_id.map(Some)
            },
            is_active: payload.is_active,
        },
    )
    .await?;
    Ok(ok(updated))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Extension(caller_permissions): Extension<EffectivePermissions>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<bool>> {
    if id == current_user.id {
        return Err(AppError::new(ErrorCode::UserCannotDeleteSelf));
    }
    validate_target_ceiling(&state, &current_user, &caller_permissions, id).await?;

    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        target_user_id = %id,
        "Deleting user"
    );

    let deleted = user::delete(&state.pool, id).await?;
    Ok(ok(deleted))
}
