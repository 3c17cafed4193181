#![allow(missing_docs)]

//! # dfs3-api
//!
//! The HTTP boundary: a thin axum router mapping `/api/v1/*` onto the
//! event/store/registry/auth crates. Handlers validate input, call into
//! those crates, and translate the result into a response — no state
//! mutation happens in this crate beyond publishing signed events and
//! writing content-addressed blobs.

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// The request timeout applied to every route, generous enough to cover
/// a multi-peer download race plus a slow client upload.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the full `/api/v1` router over `state`. Left unmounted (no
/// listener bound here) so `dfs3-node` can compose it with TLS
/// termination and graceful shutdown.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(routes::status::status))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/challenge", post(routes::auth::challenge))
        .route("/auth/verify", post(routes::auth::verify))
        .route("/users", get(routes::users::list_users))
        .route("/users/:user_id", get(routes::users::get_user))
        .route("/nodes", get(routes::nodes::list_nodes))
        .route("/nodes/:node_id", get(routes::nodes::get_node))
        .route("/events", get(routes::events::list_events))
        .route("/event/:block_id", get(routes::events::get_event))
        .route(
            "/files",
            get(routes::files::list_files).post(routes::files::upload),
        )
        .route("/files/share", post(routes::files::share))
        .route(
            // The segment is a user-chosen filename for this route and a
            // content hash for the two below; axum requires one param
            // name per tree position regardless, so `:id` is shared.
            "/files/:id",
            get(routes::files::download_by_name)
                .patch(routes::files::rename)
                .delete(routes::files::delete),
        )
        .route("/files/:id/data", get(routes::files::download_by_id))
        .route("/files/:id/meta", get(routes::files::get_meta))
        .with_state(state);

    Router::new().nest("/api/v1", api).layer((
        TraceLayer::new_for_http(),
        TimeoutLayer::new(REQUEST_TIMEOUT),
        CorsLayer::permissive(),
    ))
}
