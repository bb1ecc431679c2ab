//! Authentication Handlers
//!
//! Handles login and the current-user endpoint

use std::time::Duration;

use axum::{Json, extract::State};

use crate::auth::CurrentUser;
use crate::auth::password::verify_password_async;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};
use shared::models::{CurrentUserResponse, LoginRequest, LoginResponse};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 250;

/// POST /api/auth/login
///
/// Authenticates user credentials and returns a JWT token. Unknown user and
/// wrong password produce the same error.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("username and password are required"));
    }

    let credentials = user::find_credentials(&state.pool, &username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let Some(credentials) = credentials else {
        security_log!("WARN", "login_failed", username = username.clone(), reason = "user_not_found");
        return Err(AppError::invalid_credentials());
    };

    let password_valid =
        verify_password_async(req.password, credentials.password_hash.clone()).await?;
    if !password_valid {
        security_log!("WARN", "login_failed", username = username.clone(), reason = "invalid_password");
        return Err(AppError::invalid_credentials());
    }

    // Checked after the password so a disabled account does not reveal itself to guessers
    if !credentials.is_active {
        security_log!("WARN", "login_failed", username = username.clone(), reason = "account_disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let jwt_service = state.get_jwt_service();
    let token = jwt_service
        .generate_token(credentials.id, &credentials.username)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    let user = user::find_by_id(&state.pool, credentials.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        role = ?user.role_name,
        "User logged in successfully"
    );

    Ok(ok(LoginResponse {
        token,
        expires_in: jwt_service.expires_in_seconds(),
        user,
    }))
}

/// GET /api/auth/me
///
/// The caller and the permissions their role grants right now
pub async fn me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<ApiResponse<CurrentUserResponse>> {
    let user = user::find_by_id(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let permissions = state
        .permission_lookup()
        .effective_permissions(user.id)
        .await?;

    Ok(ok(CurrentUserResponse {
        user,
        permissions: permissions.to_sorted_vec(),
    }))
}
