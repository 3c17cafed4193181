//! Maps the single shared [`ApiError`] classification onto HTTP responses
//! in exactly one place, generalizing the teacher's JSON-RPC code/message
//! mapping (`qc-16-api-gateway/src/domain/error.rs`) to HTTP statuses.
//! Component crate errors convert into `ApiError` first (see the `From`
//! impls below), then into this wrapper via `AppError::from`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use dfs3_types::ApiError;

/// Newtype around [`ApiError`] so this crate can implement the foreign
/// `IntoResponse` trait for it (`ApiError` itself lives in `dfs3-types`,
/// which has no axum dependency).
pub struct AppError(pub ApiError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Integrity(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::TooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        AppError(value)
    }
}

impl From<dfs3_auth::AuthError> for AppError {
    fn from(value: dfs3_auth::AuthError) -> Self {
        use dfs3_auth::AuthError;
        let mapped = match value {
            AuthError::UnknownUser(msg) => ApiError::NotFound(msg),
            AuthError::ChallengeMissing(msg) => ApiError::Validation(msg),
            AuthError::InvalidSignature => ApiError::Unauthorized("invalid signature".into()),
            AuthError::Unauthorized => ApiError::Unauthorized("missing or expired session".into()),
            AuthError::Registry(e) => ApiError::Internal(e.to_string()),
            AuthError::Events(e) => ApiError::Internal(e.to_string()),
        };
        AppError(mapped)
    }
}

impl From<dfs3_store::StoreError> for AppError {
    fn from(value: dfs3_store::StoreError) -> Self {
        use dfs3_store::StoreError;
        let mapped = match value {
            StoreError::NotFound { kind, id } => ApiError::NotFound(format!("{kind} {id} not found")),
            StoreError::PathTraversal => ApiError::Validation("invalid filename".into()),
            StoreError::SizeExceeded { limit, actual } => {
                ApiError::TooLarge(format!("{actual} bytes exceeds the {limit} byte limit"))
            }
            StoreError::IntegrityMismatch { expected, actual } => {
                ApiError::Integrity(format!("expected {expected}, got {actual}"))
            }
            StoreError::InvalidId(msg) => ApiError::Validation(msg),
            StoreError::NoReplicaAvailable(file_id) => {
                ApiError::NotFound(format!("no replica of {file_id} available"))
            }
            StoreError::Io(e) => ApiError::Internal(e.to_string()),
            StoreError::Serialization(e) => ApiError::Internal(e.to_string()),
            StoreError::Fetch(msg) => ApiError::Internal(msg),
        };
        AppError(mapped)
    }
}

impl From<dfs3_registry::RegistryError> for AppError {
    fn from(value: dfs3_registry::RegistryError) -> Self {
        use dfs3_registry::RegistryError;
        let mapped = match value {
            RegistryError::NotFound { kind, id } => ApiError::NotFound(format!("{kind} {id} not found")),
            RegistryError::InvalidId(msg) => ApiError::Validation(msg),
            RegistryError::Database(e) => ApiError::Internal(e.to_string()),
            RegistryError::Serialization(e) => ApiError::Internal(e.to_string()),
        };
        AppError(mapped)
    }
}

impl From<dfs3_events::EventError> for AppError {
    fn from(value: dfs3_events::EventError) -> Self {
        AppError(ApiError::Internal(value.to_string()))
    }
}

impl From<dfs3_types::ValidationError> for AppError {
    fn from(value: dfs3_types::ValidationError) -> Self {
        AppError(ApiError::Validation(value.to_string()))
    }
}
