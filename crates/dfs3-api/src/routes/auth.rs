//! `POST /auth/register`, `POST /auth/challenge`, `POST /auth/verify`.
//! Mirrors `api/routes/auth.py`'s three handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use dfs3_types::events::{EventType, UserRegisteredPayload};
use dfs3_types::ApiError;

use crate::dto::{ChallengeRequest, ChallengeResponse, RegisterRequest, RegisterResponse, VerifyRequest, VerifyResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if state.users.exists(&body.user_id)? {
        return Err(AppError::from(ApiError::Conflict(format!(
            "user {} already registered",
            body.user_id
        ))));
    }

    let payload = UserRegisteredPayload {
        user_id: body.user_id.clone(),
        alias: body.alias,
        public_key: body.public_key,
    };
    state.publisher.publish(EventType::UserRegistered, payload).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id: body.user_id })))
}

pub async fn challenge(
    State(state): State<AppState>,
    Json(body): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, AppError> {
    let challenge = state.auth.request_challenge(&body.user_id)?;
    Ok(Json(ChallengeResponse { challenge }))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let access_token = state.auth.verify(&body.user_id, &body.signature).await?;
    Ok(Json(VerifyResponse { access_token }))
}
