use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
}

/// Liveness probe. Reports `degraded` if the value store lock is poisoned.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, records) = match state.store.record_count() {
        Ok(count) => ("ok", count),
        Err(_) => ("degraded", 0),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        records,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
