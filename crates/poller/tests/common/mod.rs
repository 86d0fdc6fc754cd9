#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use gaugewatch_core::definition::{default_definitions, ChangeToken, DefinitionSet, GaugeDefinition};
use gaugewatch_core::metric::GaugeValueSet;
use tokio::time::Instant;

use gaugewatch_poller::backoff::BackoffConfig;
use gaugewatch_poller::config::PollerConfig;
use gaugewatch_poller::source::{FetchError, TelemetrySource, ValuesSnapshot};

/// Poller configuration with the production timings and no retry jitter.
pub fn test_config() -> PollerConfig {
    PollerConfig {
        backoff: BackoffConfig {
            jitter_span: Duration::ZERO,
            ..BackoffConfig::default()
        },
        ..PollerConfig::default()
    }
}

/// In-memory telemetry server with scriptable latency and outages.
///
/// Each fetch captures the server state when it is issued, then waits out
/// its scripted delay, so a slow response carries an older state than a
/// fast one issued after it.
#[derive(Default)]
pub struct FakeServer {
    state: Mutex<FakeState>,
}

struct FakeState {
    values: GaugeValueSet,
    definitions: Vec<GaugeDefinition>,
    token: u64,
    online: bool,
    value_delays: VecDeque<Duration>,
    token_delay: Duration,
    definitions_delay: Duration,
    lagging_definitions: Option<DefinitionSet>,
    value_calls: Vec<Instant>,
    values_completed: usize,
    token_calls: usize,
    definitions_calls: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            values: GaugeValueSet::default(),
            definitions: default_definitions(),
            token: 1,
            online: true,
            value_delays: VecDeque::new(),
            token_delay: Duration::ZERO,
            definitions_delay: Duration::ZERO,
            lagging_definitions: None,
            value_calls: Vec::new(),
            values_completed: 0,
            token_calls: 0,
            definitions_calls: 0,
        }
    }
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_online(&self, online: bool) {
        self.with_state(|s| s.online = online);
    }

    pub fn set_values(&self, values: GaugeValueSet) {
        self.with_state(|s| s.values = values);
    }

    /// Replace the definitions and advance the token, like `PUT /definitions`.
    pub fn replace_definitions(&self, definitions: Vec<GaugeDefinition>) -> ChangeToken {
        self.with_state(|s| {
            s.definitions = definitions;
            s.token += 1;
            ChangeToken(s.token)
        })
    }

    /// Delay applied to the next value fetches, one entry per call.
    pub fn push_value_delay(&self, delay: Duration) {
        self.with_state(|s| s.value_delays.push_back(delay));
    }

    pub fn set_token_delay(&self, delay: Duration) {
        self.with_state(|s| s.token_delay = delay);
    }

    pub fn set_definitions_delay(&self, delay: Duration) {
        self.with_state(|s| s.definitions_delay = delay);
    }

    /// Answer the next definitions fetch with `set`, as a replica that has
    /// not caught up with the latest write would.
    pub fn serve_lagging_definitions(&self, set: DefinitionSet) {
        self.with_state(|s| s.lagging_definitions = Some(set));
    }

    /// Instants at which value fetches were issued.
    pub fn value_calls(&self) -> Vec<Instant> {
        self.with_state(|s| s.value_calls.clone())
    }

    pub fn values_completed(&self) -> usize {
        self.with_state(|s| s.values_completed)
    }

    pub fn token_calls(&self) -> usize {
        self.with_state(|s| s.token_calls)
    }

    pub fn definitions_calls(&self) -> usize {
        self.with_state(|s| s.definitions_calls)
    }
}

fn refused() -> FetchError {
    FetchError::Transport("connection refused".to_string())
}

async fn wait(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl TelemetrySource for FakeServer {
    async fn fetch_values(&self) -> Result<ValuesSnapshot, FetchError> {
        let (result, delay) = self.with_state(|s| {
            s.value_calls.push(Instant::now());
            let delay = s.value_delays.pop_front().unwrap_or_default();
            let result = if s.online {
                Ok(ValuesSnapshot {
                    values: s.values,
                    timestamp: Utc::now(),
                })
            } else {
                Err(refused())
            };
            (result, delay)
        });

        wait(delay).await;
        self.with_state(|s| s.values_completed += 1);
        result
    }

    async fn fetch_definitions(&self) -> Result<DefinitionSet, FetchError> {
        let (result, delay) = self.with_state(|s| {
            s.definitions_calls += 1;
            let result = if !s.online {
                Err(refused())
            } else if let Some(lagging) = s.lagging_definitions.take() {
                Ok(lagging)
            } else {
                Ok(DefinitionSet {
                    definitions: s.definitions.clone(),
                    token: ChangeToken(s.token),
                })
            };
            (result, s.definitions_delay)
        });

        wait(delay).await;
        result
    }

    async fn fetch_token(&self) -> Result<ChangeToken, FetchError> {
        let (result, delay) = self.with_state(|s| {
            s.token_calls += 1;
            let result = if s.online {
                Ok(ChangeToken(s.token))
            } else {
                Err(refused())
            };
            (result, s.token_delay)
        });

        wait(delay).await;
        result
    }
}

/// Advance the paused clock by `ms` milliseconds, letting the poller run.
pub async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
