use thiserror::Error;

use crate::auth::JwtError;

/// Startup and lifecycle errors.
///
/// Request-level failures use [`AppError`](crate::AppError); these are the
/// errors that stop the process before or while serving.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// 服务器生命周期 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
