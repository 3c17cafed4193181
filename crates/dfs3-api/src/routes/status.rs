use axum::Json;

use crate::dto::StatusResponse;

pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: format!("dfs3-node/{}", env!("CARGO_PKG_VERSION")),
    })
}
