//! Screen catalog handlers

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::screen;
use crate::utils::{ApiResponse, AppResult, ok};
use shared::models::ScreenWithActions;

#[derive(Debug, Deserialize)]
pub struct ScreenQuery {
    /// Include inactive screens and actions
    all: Option<bool>,
}

/// GET /api/screens - screens with their actions
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ScreenQuery>,
) -> AppResult<ApiResponse<Vec<ScreenWithActions>>> {
    let catalog = screen::find_all_with_actions(&state.pool, query.all.unwrap_or(false)).await?;
    Ok(ok(catalog))
}
