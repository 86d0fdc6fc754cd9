//! Route definitions for gauge definitions and change detection.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::definitions;
use crate::state::AppState;

/// Gauge definition routes mounted at `/definitions`.
///
/// ```text
/// GET  /         -> list_definitions
/// PUT  /         -> replace_definitions
/// GET  /token    -> check_token
/// POST /sync     -> sync_initial_values
/// POST /refresh  -> force_refresh
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(definitions::list_definitions).put(definitions::replace_definitions),
        )
        .route("/token", get(definitions::check_token))
        .route("/sync", post(definitions::sync_initial_values))
        .route("/refresh", post(definitions::force_refresh))
}
