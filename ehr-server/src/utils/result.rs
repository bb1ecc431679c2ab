//! Unified Result Types
//!
//! Provides type aliases for commonly used Result types across the application

use crate::AppError;

/// Application-level Result type
///
/// Used in HTTP handlers, the authorization gate and repositories
pub type AppResult<T> = Result<T, AppError>;
