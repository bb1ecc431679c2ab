//! 统一错误处理
//!
//! Error and response types live in `shared::error` so that clients and the
//! server agree on codes. This module re-exports them and adds the success
//! helpers used by handlers.
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::new(ErrorCode::RoleNotFound))
//!
//! // 返回成功响应
//! Ok(ok(role))
//! ```

use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, ErrorCategory, ErrorCode};

pub use super::result::AppResult;

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse::success(data)
}
