//! Connection status as observed from value-poll outcomes.

use std::time::Duration;

use tokio::time::Instant;

/// Client-side view of the link to the telemetry server.
///
/// Starts connected; only value-poll outcomes change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    /// Consecutive failed value polls since the last success.
    pub failure_count: u32,
    /// When the current outage began.
    pub disconnected_since: Option<Instant>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connected: true,
            failure_count: 0,
            disconnected_since: None,
        }
    }
}

impl ConnectionState {
    /// Record a successful poll. Returns `true` if this ended an outage.
    pub fn on_success(&mut self) -> bool {
        let recovered = !self.connected;
        *self = Self::default();
        recovered
    }

    /// Record a failed poll at `now`. Returns the new failure count.
    pub fn on_failure(&mut self, now: Instant) -> u32 {
        self.connected = false;
        self.failure_count = self.failure_count.saturating_add(1);
        self.disconnected_since.get_or_insert(now);
        self.failure_count
    }

    /// How long the current outage has lasted, if there is one.
    pub fn disconnected_for(&self, now: Instant) -> Option<Duration> {
        self.disconnected_since
            .map(|since| now.saturating_duration_since(since))
    }
}
