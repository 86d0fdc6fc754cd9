//! Exponential-backoff delays for value-poll retries.
//!
//! After `n` consecutive failures the next attempt waits
//! `min(2^n * base, cap)` plus a uniform jitter in `[0, jitter_span]`.

use std::time::Duration;

use rand::Rng;

/// Tunable parameters for the retry backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay unit doubled on every failure.
    pub base: Duration,
    /// Upper bound on the exponential part of the delay.
    pub cap: Duration,
    /// Width of the random jitter added on top of the capped delay.
    pub jitter_span: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            cap: Duration::from_millis(10_000),
            jitter_span: Duration::from_millis(300),
        }
    }
}

impl BackoffConfig {
    /// The deterministic part of the delay after `failures` consecutive
    /// failures, clamped to [`BackoffConfig::cap`].
    pub fn base_delay(&self, failures: u32) -> Duration {
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }

    /// Full retry delay: [`base_delay`](Self::base_delay) plus jitter.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        self.base_delay(failures) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let span = u64::try_from(self.jitter_span.as_millis()).unwrap_or(u64::MAX);
        if span == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=span))
    }
}
