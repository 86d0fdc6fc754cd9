//! Handlers for technical-record submission and the record log.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use gaugewatch_core::record::RecordInput;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::handlers::json_body;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /records`.
#[derive(Debug, Deserialize)]
pub struct ListRecordsParams {
    /// Keep only the newest `limit` records.
    pub limit: Option<usize>,
}

/// GET /api/v1/records
pub async fn list_records(
    State(state): State<AppState>,
    params: Result<Query<ListRecordsParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let records = state.store.list_records(params.limit)?;

    Ok(Json(DataResponse { data: records }))
}

/// POST /api/v1/records
///
/// Store a record and apply the derivation rules. Returns the stored record
/// and the post-update value set.
pub async fn submit_record(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let input = RecordInput::from_json(&json_body(body)?)?;

    let submitted = state.store.submit_record(input)?;

    tracing::info!(
        record_id = %submitted.record.id,
        temperature = input.temperature,
        voltage = input.voltage,
        pressure = input.pressure,
        "Technical record stored",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: submitted })))
}
