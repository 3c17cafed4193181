//! `GET /nodes`, `GET /nodes/{node_id}`. Both require a caller session;
//! mirrors `api/routes/nodes.py`.

use axum::extract::{Path, State};
use axum::Json;

use dfs3_types::ids::NodeId;
use dfs3_types::{ApiError, NodeEntry, NodeRecord};

use crate::error::AppError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

pub async fn list_nodes(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
) -> Result<Json<Vec<NodeEntry>>, AppError> {
    Ok(Json(state.nodes.list_nodes()?))
}

pub async fn get_node(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(node_id): Path<NodeId>,
) -> Result<Json<NodeRecord>, AppError> {
    state
        .nodes
        .get(&node_id)?
        .map(Json)
        .ok_or_else(|| AppError::from(ApiError::NotFound(format!("node {node_id} not found"))))
}
