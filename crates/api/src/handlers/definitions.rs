//! Handlers for gauge definitions and the change token.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use gaugewatch_core::definition::{ChangeToken, GaugeDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::handlers::typed_body;
use crate::response::{no_cache_headers, DataResponse};
use crate::state::AppState;

/// Body of `PUT /definitions`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceDefinitionsRequest {
    pub definitions: Vec<GaugeDefinition>,
}

/// Body of the token endpoints.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: ChangeToken,
}

/// GET /api/v1/definitions
///
/// Ordered definitions plus the token of the revision they belong to.
pub async fn list_definitions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let set = state.registry.list()?;

    Ok((no_cache_headers(), Json(DataResponse { data: set })))
}

/// PUT /api/v1/definitions
///
/// Full replacement. Every definition must satisfy `min < max`.
pub async fn replace_definitions(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let input: ReplaceDefinitionsRequest = typed_body(body)?;

    let set = state.registry.replace_all(input.definitions)?;

    tracing::info!(
        count = set.definitions.len(),
        token = set.token.0,
        "Gauge definitions replaced",
    );

    Ok(Json(DataResponse { data: set }))
}

/// GET /api/v1/definitions/token
///
/// Cheap change check; safe to poll every few seconds.
pub async fn check_token(State(state): State<AppState>) -> impl IntoResponse {
    let token = state.registry.check_token();

    (no_cache_headers(), Json(DataResponse { data: TokenResponse { token } }))
}

/// POST /api/v1/definitions/sync
///
/// Copy the current gauge values into each matching definition's
/// `initialValue`.
pub async fn sync_initial_values(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let reading = state.store.read_values()?;
    let set = state.registry.sync_initial_from_current(&reading.values)?;

    tracing::info!(token = set.token.0, "Initial values synced from current values");

    Ok(Json(DataResponse { data: set }))
}

/// POST /api/v1/definitions/refresh
///
/// Advance the change token so every poller reloads its definitions.
pub async fn force_refresh(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let token = state.registry.touch()?;

    tracing::info!(token = token.0, "Definition refresh forced");

    Ok(Json(DataResponse { data: TokenResponse { token } }))
}
