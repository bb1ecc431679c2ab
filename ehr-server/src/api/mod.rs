//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查 (公共)
//! - [`auth`] - 登录和当前用户
//! - [`screens`] - 权限目录 (screen + action)
//! - [`roles`] - 角色及其授权管理
//! - [`users`] - 用户管理
//!
//! Every route except login and health passes `require_auth`; each
//! management route additionally sits behind its own permission gate.

pub mod auth;
pub mod health;
pub mod roles;
pub mod screens;
pub mod users;

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, StatusCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use crate::middleware;

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no global middleware)
///
/// Permission gates need the state up front, so it is passed in here.
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        // Auth API - login is public, /me requires a token
        .merge(auth::router())
        // Catalog API - Roles/View
        .merge(screens::router(state))
        // Role API - Roles/*
        .merge(roles::router(state))
        // User API - Users/*
        .merge(users::router(state))
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by in-process tests. Layers run outermost
/// first in reverse of the order added: CORS, compression, request ID,
/// logging, trace, timeout, then authentication. Auth rejections carry CORS
/// headers and a request ID like any other response.
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router(state)
        // ========== Application Middleware ==========
        // JWT authentication - innermost, injects CurrentUser for the handlers
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        // ========== Tower HTTP Middleware ==========
        // Requests running longer than the configured budget get 408
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_millis(state.config.request_timeout_ms),
        ))
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Request ID - Generate unique ID for each request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        // Compression - Gzip compress responses
        .layer(CompressionLayer::new())
        // CORS - outermost, so every response carries the headers
        .layer(CorsLayer::permissive())
}
