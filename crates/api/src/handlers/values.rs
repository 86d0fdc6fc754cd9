//! Handlers for the current gauge values.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use gaugewatch_core::record::ValueOverride;
use serde_json::Value;

use crate::error::AppResult;
use crate::handlers::json_body;
use crate::response::{no_cache_headers, DataResponse};
use crate::state::AppState;

/// GET /api/v1/values
///
/// Current value set plus the server timestamp. Never cacheable.
pub async fn get_values(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let reading = state.store.read_values()?;

    Ok((no_cache_headers(), Json(DataResponse { data: reading })))
}

/// PUT /api/v1/values
///
/// Replace the supplied metrics directly, bypassing the derivation rules.
pub async fn override_values(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let patch = ValueOverride::from_json(&json_body(body)?)?;

    let reading = state.store.override_values(&patch)?;

    for (metric, value) in patch.fields() {
        tracing::info!(%metric, value, "Gauge value overridden");
    }

    Ok((no_cache_headers(), Json(DataResponse { data: reading })))
}
