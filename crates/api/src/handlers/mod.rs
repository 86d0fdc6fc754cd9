//! Request handlers for the telemetry API.
//!
//! Each submodule provides async handler functions for one resource. Handlers
//! delegate to the shared stores in [`AppState`](crate::state::AppState) and
//! map errors via [`AppError`].

pub mod definitions;
pub mod records;
pub mod settings;
pub mod values;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use gaugewatch_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Unwrap a JSON body, mapping malformed JSON to `BAD_REQUEST`.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Deserialize a JSON body into `T`, mapping shape errors to `VALIDATION_ERROR`.
pub(crate) fn typed_body<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, AppError> {
    let value = json_body(body)?;
    serde_json::from_value(value).map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}
