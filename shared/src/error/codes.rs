//! Unified error codes for the EHR access server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Catalog errors
//! - 8xxx: Account errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the admin frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Catalog ====================
    /// Screen action not found
    ScreenActionNotFound = 3002,
    /// Action does not belong to the given screen
    ActionScreenMismatch = 3003,

    // ==================== 8xxx: Account ====================
    /// User not found
    UserNotFound = 8001,
    /// Username already taken
    UserNameExists = 8002,
    /// A user cannot delete their own account
    UserCannotDeleteSelf = 8003,
    /// Role not found
    RoleNotFound = 8101,
    /// Role name already exists
    RoleNameExists = 8102,
    /// Role is still assigned to users
    RoleInUse = 8103,
    /// System role cannot be modified
    RoleIsSystem = 8104,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Numeric value of this code
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message
    pub fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            // Auth
            ErrorCode::NotAuthenticated => "Authentication required.",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Token expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::AccountDisabled => "Account has been disabled",
            // Permission
            ErrorCode::PermissionDenied => "Access denied.",
            // Catalog
            ErrorCode::ScreenActionNotFound => "Screen action not found",
            ErrorCode::ActionScreenMismatch => "Action does not belong to screen",
            // Account
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserNameExists => "Username already exists",
            ErrorCode::UserCannotDeleteSelf => "Cannot delete own account",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::RoleNameExists => "Role name already exists",
            ErrorCode::RoleInUse => "Role is currently in use",
            ErrorCode::RoleIsSystem => "Cannot modify system role",
            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            // Catalog
            3002 => Ok(ErrorCode::ScreenActionNotFound),
            3003 => Ok(ErrorCode::ActionScreenMismatch),
            // Account
            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UserNameExists),
            8003 => Ok(ErrorCode::UserCannotDeleteSelf),
            8101 => Ok(ErrorCode::RoleNotFound),
            8102 => Ok(ErrorCode::RoleNameExists),
            8103 => Ok(ErrorCode::RoleInUse),
            8104 => Ok(ErrorCode::RoleIsSystem),
            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
