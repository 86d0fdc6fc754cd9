use std::time::Duration;

use crate::backoff::BackoffConfig;

/// Poller configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// API root including `/api/v1`.
    pub base_url: String,
    /// Delay between value polls while connected.
    pub value_interval: Duration,
    /// Upper bound on every single request.
    pub request_timeout: Duration,
    /// Delay between change-token checks.
    pub token_interval: Duration,
    /// Full definitions reload regardless of the token.
    pub definitions_resync: Duration,
    pub backoff: BackoffConfig,
    /// How long [`Poller::shutdown`](crate::poller::Poller::shutdown) waits
    /// for the actor to stop.
    pub shutdown_timeout: Duration,
    /// Record simulator period; `None` disables the simulator.
    pub simulate_interval: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api/v1".to_string(),
            value_interval: Duration::from_millis(250),
            request_timeout: Duration::from_millis(1500),
            token_interval: Duration::from_millis(3000),
            definitions_resync: Duration::from_secs(30),
            backoff: BackoffConfig::default(),
            shutdown_timeout: Duration::from_secs(5),
            simulate_interval: None,
        }
    }
}

impl PollerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                        |
    /// |---------------------------|--------------------------------|
    /// | `TELEMETRY_BASE_URL`      | `http://localhost:3001/api/v1` |
    /// | `POLL_INTERVAL_MS`        | `250`                          |
    /// | `POLL_TIMEOUT_MS`         | `1500`                         |
    /// | `TOKEN_CHECK_INTERVAL_MS` | `3000`                         |
    /// | `DEFINITIONS_RESYNC_SECS` | `30`                           |
    /// | `BACKOFF_BASE_MS`         | `250`                          |
    /// | `BACKOFF_CAP_MS`          | `10000`                        |
    /// | `BACKOFF_JITTER_MS`       | `300`                          |
    /// | `SIMULATE_INTERVAL_MS`    | unset (simulator off)          |
    ///
    /// Polling, timeout, token, resync and simulator periods must be
    /// greater than zero.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("TELEMETRY_BASE_URL").unwrap_or(defaults.base_url);

        Self {
            base_url,
            value_interval: env_period("POLL_INTERVAL_MS", Duration::from_millis)
                .unwrap_or(defaults.value_interval),
            request_timeout: env_period("POLL_TIMEOUT_MS", Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            token_interval: env_period("TOKEN_CHECK_INTERVAL_MS", Duration::from_millis)
                .unwrap_or(defaults.token_interval),
            definitions_resync: env_period("DEFINITIONS_RESYNC_SECS", Duration::from_secs)
                .unwrap_or(defaults.definitions_resync),
            backoff: BackoffConfig {
                base: env_millis("BACKOFF_BASE_MS").unwrap_or(defaults.backoff.base),
                cap: env_millis("BACKOFF_CAP_MS").unwrap_or(defaults.backoff.cap),
                jitter_span: env_millis("BACKOFF_JITTER_MS")
                    .unwrap_or(defaults.backoff.jitter_span),
            },
            shutdown_timeout: defaults.shutdown_timeout,
            simulate_interval: env_period("SIMULATE_INTERVAL_MS", Duration::from_millis),
        }
    }
}

/// Read a `u64` env var. Panics at startup on an unparseable value.
fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().map(|v| parse_u64(name, &v))
}

/// Read a period env var. Panics at startup on an unparseable or zero value.
fn env_period(name: &str, unit: fn(u64) -> Duration) -> Option<Duration> {
    std::env::var(name).ok().map(|v| parse_period(name, &v, unit))
}

fn parse_u64(name: &str, raw: &str) -> u64 {
    raw.parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid u64"))
}

fn parse_period(name: &str, raw: &str, unit: fn(u64) -> Duration) -> Duration {
    match parse_u64(name, raw) {
        0 => panic!("{name} must be greater than zero"),
        n => unit(n),
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env_u64(name).map(Duration::from_millis)
}
