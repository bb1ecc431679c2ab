//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so handlers check here
//! before anything reaches a repository.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: role, screen, action
pub const MAX_NAME_LEN: usize = 200;

/// Login names
pub const MAX_USERNAME_LEN: usize = 64;

/// Role descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

/// Validate a plaintext password before hashing.
pub fn validate_password(value: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long ({len} chars, max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(())
}

/// Validate a login name: non-empty, bounded, no whitespace.
pub fn validate_username(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "username", MAX_USERNAME_LEN)?;
    if value.chars().any(char::is_whitespace) {
        return Err(AppError::validation("username must not contain whitespace"));
    }
    Ok(())
}
