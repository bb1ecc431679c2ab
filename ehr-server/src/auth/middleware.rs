//! 认证中间件
//!
//! 为 JWT 认证和授权网关提供 Axum 中间件

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppError;
use crate::auth::permissions::{PermissionRequirement, authorize};
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Paths reachable without a token
const PUBLIC_API_PATHS: &[&str] = &["/api/auth/login", "/api/health"];

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展，并在响应扩展中保留一份。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/auth/login`, `/api/health`
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 TokenInvalid |
/// | `sub` 不是用户 ID | 401 NotAuthenticated |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if PUBLIC_API_PATHS.contains(&path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::not_authenticated());
        }
    };

    let claims = match state.get_jwt_service().validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            return match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            };
        }
    };

    // A verified token whose subject is not a user id carries no identity
    let user = CurrentUser::try_from(claims).map_err(|e| {
        security_log!(
            "WARN",
            "auth_no_subject",
            error = format!("{}", e),
            uri = format!("{:?}", req.uri())
        );
        AppError::not_authenticated()
    })?;

    req.extensions_mut().insert(user.clone());
    let mut response = next.run(req).await;
    // Outer layers (request logging) read the caller from the response
    response.extensions_mut().insert(user);
    Ok(response)
}

type GateFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// 授权网关中间件 - 要求 (screen, action) 权限
///
/// Resolves the caller's effective permissions fresh on every request and
/// rejects before the handler runs. On success the resolved
/// [`EffectivePermissions`](shared::models::EffectivePermissions) is inserted
/// into request extensions.
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/roles", get(handler::list))
///     .route_layer(middleware::from_fn_with_state(
///         state.clone(),
///         require_permission("Roles", "View"),
///     ));
/// ```
///
/// # 错误
///
/// 未登录返回 401，无权限返回 403
pub fn require_permission(
    screen: &'static str,
    action: &'static str,
) -> impl Fn(State<ServerState>, Request, Next) -> GateFuture + Clone + Send + Sync + 'static {
    let requirement = PermissionRequirement::new(screen, action);

    move |State(state): State<ServerState>, mut req: Request, next: Next| {
        Box::pin(async move {
            let user = req.extensions().get::<CurrentUser>().cloned();
            let permissions =
                authorize(user.as_ref(), requirement, state.permission_lookup()).await?;

            req.extensions_mut().insert(permissions);
            Ok(next.run(req).await)
        })
    }
}
