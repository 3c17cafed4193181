//! # Shared Error Types
//!
//! `ValidationError` covers malformed identifiers/fields at the type
//! boundary (see `ids.rs`); `ApiError` is the single classification every
//! component error eventually maps into before it reaches the HTTP layer.

use thiserror::Error;

/// A value failed to parse into one of the typed identifiers in `ids.rs`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} does not match the expected pattern: {value:?}")]
    PatternMismatch { field: &'static str, value: String },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// The uniform error classification used across dfs3: every component
/// error (`dfs3-events::EventError`, `dfs3-store::StoreError`, ...)
/// converts into one of these variants, and `dfs3-api` maps each variant to
/// exactly one HTTP status in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("payload too large: {0}")]
    TooLarge(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Validation(value.to_string())
    }
}
