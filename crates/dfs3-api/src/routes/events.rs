//! `GET /events`, `GET /event/{block_id}`. Public — no session required,
//! matching the original's explicit comment that event history is public
//! information (`api/routes/events.py`).

use axum::extract::{Path, State};
use axum::Json;

use dfs3_types::ids::BlockId;
use dfs3_types::ApiError;

use crate::dto::EventEntry;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventEntry>>, AppError> {
    let entries = state.event_index.list_events()?;
    Ok(Json(entries.into_iter().map(EventEntry::from).collect()))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(block_id): Path<BlockId>,
) -> Result<Json<EventEntry>, AppError> {
    state
        .event_index
        .get(&block_id)?
        .map(|e| Json(EventEntry::from(e)))
        .ok_or_else(|| AppError::from(ApiError::NotFound(format!("event {block_id} not found"))))
}
