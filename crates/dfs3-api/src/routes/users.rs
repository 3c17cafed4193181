//! `GET /users`, `GET /users/{user_id}`. Both require a caller session;
//! mirrors `api/routes/users.py`.

use axum::extract::{Path, State};
use axum::Json;

use dfs3_types::ids::UserId;
use dfs3_types::{ApiError, UserRecord};

use crate::error::AppError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    Ok(Json(state.users.list_users()?))
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserRecord>, AppError> {
    state
        .users
        .get(&user_id)?
        .map(Json)
        .ok_or_else(|| AppError::from(ApiError::NotFound(format!("user {user_id} not found"))))
}
