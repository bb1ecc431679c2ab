//! Shared types for the EHR access server
//!
//! Domain models for the permission catalog, the unified error system,
//! and response envelopes used by the server and its clients.

pub mod error;
pub mod models;
pub mod pagination;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use pagination::{PageQuery, PaginatedResponse};
