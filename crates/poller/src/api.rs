//! REST client for the GaugeWatch telemetry API.
//!
//! Wraps the `/api/v1` endpoints using [`reqwest`] and unwraps the
//! `{ "data": ... }` envelope.

use std::time::Duration;

use async_trait::async_trait;
use gaugewatch_core::definition::{ChangeToken, DefinitionSet, GaugeDefinition};
use gaugewatch_core::metric::GaugeValueSet;
use gaugewatch_core::record::TechnicalRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::source::{FetchError, TelemetrySource, ValuesSnapshot};

/// HTTP client for one telemetry server.
#[derive(Debug, Clone)]
pub struct TelemetryApi {
    client: reqwest::Client,
    base_url: String,
}

/// Response of `POST /records`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedRecord {
    pub record: TechnicalRecord,
    pub values: GaugeValueSet,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct TokenBody {
    token: ChangeToken,
}

/// Errors from the telemetry REST layer.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryApiError {
    /// The HTTP request itself failed, or its body could not be decoded.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Telemetry API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<TelemetryApiError> for FetchError {
    fn from(err: TelemetryApiError) -> Self {
        match err {
            TelemetryApiError::Request(e) if e.is_decode() => FetchError::Decode(e.to_string()),
            TelemetryApiError::Request(e) => FetchError::Transport(e.to_string()),
            TelemetryApiError::ApiError { status, body } => FetchError::Status { status, body },
        }
    }
}

impl TelemetryApi {
    /// * `base_url` - API root, e.g. `http://localhost:3001/api/v1`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Client whose every request gives up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TelemetryApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /values`
    pub async fn get_values(&self) -> Result<ValuesSnapshot, TelemetryApiError> {
        let response = self.client.get(self.url("/values")).send().await?;
        Self::parse_response(response).await
    }

    /// `GET /definitions`
    pub async fn get_definitions(&self) -> Result<DefinitionSet, TelemetryApiError> {
        let response = self.client.get(self.url("/definitions")).send().await?;
        Self::parse_response(response).await
    }

    /// `GET /definitions/token`
    pub async fn get_token(&self) -> Result<ChangeToken, TelemetryApiError> {
        let response = self.client.get(self.url("/definitions/token")).send().await?;
        let body: TokenBody = Self::parse_response(response).await?;
        Ok(body.token)
    }

    /// `POST /records`
    pub async fn submit_record(
        &self,
        temperature: f64,
        voltage: f64,
        pressure: f64,
    ) -> Result<SubmittedRecord, TelemetryApiError> {
        let body = serde_json::json!({
            "temperature": temperature,
            "voltage": voltage,
            "pressure": pressure,
        });

        let response = self.client.post(self.url("/records")).json(&body).send().await?;
        Self::parse_response(response).await
    }

    /// `PUT /definitions`
    pub async fn replace_definitions(
        &self,
        definitions: &[GaugeDefinition],
    ) -> Result<DefinitionSet, TelemetryApiError> {
        let body = serde_json::json!({ "definitions": definitions });

        let response = self.client.put(self.url("/definitions")).json(&body).send().await?;
        Self::parse_response(response).await
    }

    /// `POST /definitions/refresh`
    pub async fn force_refresh(&self) -> Result<ChangeToken, TelemetryApiError> {
        let response = self.client.post(self.url("/definitions/refresh")).send().await?;
        let body: TokenBody = Self::parse_response(response).await?;
        Ok(body.token)
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TelemetryApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TelemetryApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Check the status, then decode the `data` member of the envelope.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TelemetryApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope: DataEnvelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl TelemetrySource for TelemetryApi {
    async fn fetch_values(&self) -> Result<ValuesSnapshot, FetchError> {
        Ok(self.get_values().await?)
    }

    async fn fetch_definitions(&self) -> Result<DefinitionSet, FetchError> {
        Ok(self.get_definitions().await?)
    }

    async fn fetch_token(&self) -> Result<ChangeToken, FetchError> {
        Ok(self.get_token().await?)
    }
}
