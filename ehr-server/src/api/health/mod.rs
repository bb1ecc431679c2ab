//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/health | GET | 健康检查 (含数据库探测) | 无 |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "database": "ok", "uptime_secs": 42 }
//! ```

use std::sync::OnceLock;
use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// 健康检查路由 - 公共路由 (无需认证)
pub fn router() -> Router<ServerState> {
    STARTED_AT.get_or_init(Instant::now);
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 状态 (ok | degraded)
    status: &'static str,
    version: &'static str,
    /// 数据库状态 (ok | error)
    database: &'static str,
    uptime_secs: u64,
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Health check database query failed"))
        .is_ok();

    Json(HealthResponse {
        status: if db_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if db_ok { "ok" } else { "error" },
        uptime_secs: STARTED_AT
            .get()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or_default(),
    })
}
