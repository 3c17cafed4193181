//! `require_auth(bearer)` lifted into an axum extractor: handlers that
//! need a caller identity take `AuthenticatedUser` as an argument instead
//! of pulling the header out by hand.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use dfs3_types::ids::UserId;

use crate::error::AppError;
use crate::state::AppState;

pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::from(dfs3_auth::AuthError::Unauthorized))?;

        let bearer = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::from(dfs3_auth::AuthError::Unauthorized))?;

        let user_id = state.auth.require_auth(bearer)?;
        Ok(AuthenticatedUser(user_id))
    }
}
