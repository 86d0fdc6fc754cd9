//! The transport seam between the poller and the telemetry server.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gaugewatch_core::definition::{ChangeToken, DefinitionSet};
use gaugewatch_core::metric::GaugeValueSet;
use serde::Deserialize;

/// One successful read of the server's value set.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ValuesSnapshot {
    pub values: GaugeValueSet,
    /// Server time of the read.
    pub timestamp: DateTime<Utc>,
}

/// Why a fetch produced nothing usable. Never fatal to the poller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, reset, DNS failure and the like.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// Short machine-readable code shown in the disconnect banner.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "CONN_TIMEOUT",
            FetchError::Transport(_) => "CONN_FAILED",
            FetchError::Status { .. } => "HTTP_STATUS",
            FetchError::Decode(_) => "BAD_PAYLOAD",
        }
    }
}

/// Where the poller reads values, definitions and the change token from.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch_values(&self) -> Result<ValuesSnapshot, FetchError>;

    async fn fetch_definitions(&self) -> Result<DefinitionSet, FetchError>;

    async fn fetch_token(&self) -> Result<ChangeToken, FetchError>;
}
