//! 认证授权模块
//!
//! 提供 JWT 认证、密码哈希、授权网关和中间件：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_auth`] - 认证中间件
//! - [`require_permission`] - 授权网关中间件 (screen, action)
//! - [`authorize`] - 网关判定逻辑 (纯异步函数)

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_permission};
pub use permissions::{PermissionRequirement, authorize};
