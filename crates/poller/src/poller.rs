//! The poller actor.
//!
//! One task owns every piece of client state. Fetches run as tasks in a
//! [`JoinSet`]; their completions, timer ticks and commands from the
//! [`Poller`] handle are the actor's only inputs. Every state change is
//! published as a [`PollerSnapshot`] through a `watch` channel.
//!
//! Value polling and configuration polling are independent:
//!
//! - values are fetched every `value_interval` while connected, and after an
//!   exponential backoff delay while disconnected. At most one scheduled value
//!   fetch is in flight.
//! - the change token is checked every `token_interval`. When it differs from
//!   the token of the applied definitions the definitions are refetched.
//!
//! Every fetch carries a sequence number and each stream drops responses older
//! than the newest one it has applied.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gaugewatch_core::definition::{ChangeToken, DefinitionSet, GaugeDefinition};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::connection::ConnectionState;
use crate::sequence::{SequenceCounter, SequenceGate};
use crate::source::{FetchError, TelemetrySource, ValuesSnapshot};
use crate::view::{render, GaugeDisplay};

/// Snapshot republish period while disconnected, so outage timers advance.
const BANNER_REFRESH: Duration = Duration::from_secs(1);
/// Floor for ticker periods; `tokio::time::interval` panics on zero.
const MIN_TICK: Duration = Duration::from_millis(1);

const COMMAND_BUFFER: usize = 16;

/// Everything a dashboard needs to render, as of one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerSnapshot {
    /// Definitions applied most recently, in server order.
    pub definitions: Vec<GaugeDefinition>,
    /// Token carried by `definitions`.
    pub applied_token: Option<ChangeToken>,
    /// Newest token seen from the server.
    pub observed_token: Option<ChangeToken>,
    /// The server reported a definitions revision that has not landed yet.
    pub config_changed: bool,
    pub last_known_good: Option<ValuesSnapshot>,
    pub connection: ConnectionState,
    /// When the next value retry fires. Only set while disconnected and
    /// waiting.
    pub next_retry_at: Option<Instant>,
    /// Most recent value-poll failure of the current outage.
    pub last_error: Option<FetchError>,
}

impl PollerSnapshot {
    /// One display entry per definition.
    pub fn gauges(&self) -> Vec<GaugeDisplay> {
        render(
            &self.definitions,
            self.last_known_good.as_ref().map(|s| &s.values),
            &self.connection,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("poller is not running")]
    Stopped,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    RefreshValues,
    RefreshDefinitions,
}

/// Handle to a running poller actor.
///
/// Dropping the handle stops the actor.
pub struct Poller {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<PollerSnapshot>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl Poller {
    /// Start polling `source`. Must be called from within a Tokio runtime.
    pub fn spawn(source: Arc<dyn TelemetrySource>, config: PollerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(PollerSnapshot::default());
        let cancel = CancellationToken::new();
        let shutdown_timeout = config.shutdown_timeout;

        let actor = Actor::new(source, config, snapshot_tx);
        let handle = tokio::spawn(actor.run(command_rx, cancel.clone()));

        Self {
            commands: command_tx,
            snapshot: snapshot_rx,
            cancel,
            handle: Some(handle),
            shutdown_timeout,
        }
    }

    /// A receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.snapshot.clone()
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> PollerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Fetch values now, outside the regular schedule.
    pub async fn refresh_values(&self) -> Result<(), PollerError> {
        self.send(Command::RefreshValues).await
    }

    /// Fetch definitions now, regardless of the change token.
    pub async fn refresh_definitions(&self) -> Result<(), PollerError> {
        self.send(Command::RefreshDefinitions).await
    }

    async fn send(&self, command: Command) -> Result<(), PollerError> {
        if self.cancel.is_cancelled() {
            return Err(PollerError::Stopped);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| PollerError::Stopped)
    }

    /// Stop the actor and wait for it to exit. In-flight fetches are aborted
    /// and their results never applied.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();

        let Some(handle) = self.handle.take() else {
            return;
        };
        match tokio::time::timeout(self.shutdown_timeout, handle).await {
            Ok(Ok(())) => tracing::info!("Poller stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Poller task failed"),
            Err(_) => tracing::warn!(
                timeout_ms = self.shutdown_timeout.as_millis() as u64,
                "Poller did not stop in time",
            ),
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Completion of one fetch task.
enum Outcome {
    Values {
        seq: u64,
        scheduled: bool,
        result: Result<ValuesSnapshot, FetchError>,
    },
    Token {
        seq: u64,
        result: Result<ChangeToken, FetchError>,
    },
    Definitions {
        seq: u64,
        result: Result<DefinitionSet, FetchError>,
    },
}

struct Actor {
    source: Arc<dyn TelemetrySource>,
    config: PollerConfig,
    snapshot_tx: watch::Sender<PollerSnapshot>,
    tasks: JoinSet<Outcome>,

    sequence: SequenceCounter,
    values_gate: SequenceGate,
    token_gate: SequenceGate,
    definitions_gate: SequenceGate,

    connection: ConnectionState,
    last_known_good: Option<ValuesSnapshot>,
    last_error: Option<FetchError>,
    /// Sequence number of the scheduled value fetch in flight.
    scheduled_values: Option<u64>,
    /// When the next scheduled value fetch is due. `None` while one is in
    /// flight.
    next_value_at: Option<Instant>,

    token_in_flight: bool,
    definitions_in_flight: usize,
    definitions: Vec<GaugeDefinition>,
    applied_token: Option<ChangeToken>,
    observed_token: Option<ChangeToken>,
    /// Sequence number of the response `observed_token` came from.
    observed_seq: u64,
}

impl Actor {
    fn new(
        source: Arc<dyn TelemetrySource>,
        config: PollerConfig,
        snapshot_tx: watch::Sender<PollerSnapshot>,
    ) -> Self {
        Self {
            source,
            config,
            snapshot_tx,
            tasks: JoinSet::new(),
            sequence: SequenceCounter::default(),
            values_gate: SequenceGate::default(),
            token_gate: SequenceGate::default(),
            definitions_gate: SequenceGate::default(),
            connection: ConnectionState::default(),
            last_known_good: None,
            last_error: None,
            scheduled_values: None,
            next_value_at: None,
            token_in_flight: false,
            definitions_in_flight: 0,
            definitions: Vec::new(),
            applied_token: None,
            observed_token: None,
            observed_seq: 0,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>, cancel: CancellationToken) {
        let mut token_ticker = tokio::time::interval(self.config.token_interval.max(MIN_TICK));
        let mut resync_ticker =
            tokio::time::interval(self.config.definitions_resync.max(MIN_TICK));
        let mut banner_ticker = tokio::time::interval(BANNER_REFRESH);
        for ticker in [&mut token_ticker, &mut resync_ticker, &mut banner_ticker] {
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        tracing::info!(
            value_interval_ms = self.config.value_interval.as_millis() as u64,
            token_interval_ms = self.config.token_interval.as_millis() as u64,
            request_timeout_ms = self.config.request_timeout.as_millis() as u64,
            "Poller started",
        );

        self.next_value_at = Some(Instant::now());

        loop {
            let value_due = self.next_value_at;

            tokio::select! {
                biased;

                () = cancel.cancelled() => break,

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    match joined {
                        Ok(outcome) => self.apply(outcome),
                        Err(e) => tracing::error!(error = %e, "Fetch task failed"),
                    }
                }

                Some(command) = commands.recv() => self.handle_command(command),

                () = sleep_until_due(value_due) => self.issue_scheduled_values(),

                _ = token_ticker.tick() => self.on_token_tick(),

                _ = resync_ticker.tick() => self.on_resync_tick(),

                _ = banner_ticker.tick() => {
                    if !self.connection.connected {
                        self.publish();
                    }
                }
            }
        }

        self.tasks.shutdown().await;
        tracing::debug!("Poller actor exited");
    }

    fn handle_command(&mut self, command: Command) {
        tracing::debug!(?command, "Manual refresh requested");
        match command {
            Command::RefreshValues => {
                self.spawn_values(false);
            }
            Command::RefreshDefinitions => self.spawn_definitions(),
        }
    }

    // ---- values ----

    fn issue_scheduled_values(&mut self) {
        self.next_value_at = None;
        if self.scheduled_values.is_none() {
            self.scheduled_values = Some(self.spawn_values(true));
        }
        self.publish();
    }

    fn apply_values(
        &mut self,
        seq: u64,
        scheduled: bool,
        result: Result<ValuesSnapshot, FetchError>,
    ) {
        let finished_scheduled = scheduled && self.scheduled_values == Some(seq);
        if finished_scheduled {
            self.scheduled_values = None;
        }

        let admitted = self.values_gate.admit(seq);
        if admitted {
            match result {
                Ok(snapshot) => {
                    if self.connection.on_success() {
                        tracing::info!("Connection to telemetry server restored");
                    }
                    self.last_known_good = Some(snapshot);
                    self.last_error = None;
                }
                Err(err) => {
                    let failures = self.connection.on_failure(Instant::now());
                    tracing::warn!(failures, code = err.code(), error = %err, "Value poll failed");
                    self.last_error = Some(err);
                }
            }
        } else {
            tracing::debug!(seq, "Discarded stale value response");
        }

        if self.scheduled_values.is_none() && (finished_scheduled || admitted) {
            self.arm_value_timer();
        }
    }

    fn arm_value_timer(&mut self) {
        let delay = if self.connection.connected {
            self.config.value_interval
        } else {
            self.config
                .backoff
                .retry_delay(self.connection.failure_count)
        };
        self.next_value_at = Some(Instant::now() + delay);
    }

    // ---- definitions and change token ----

    fn definitions_stale(&self) -> bool {
        self.applied_token.is_none() || self.applied_token != self.observed_token
    }

    fn on_token_tick(&mut self) {
        if !self.token_in_flight {
            self.spawn_token();
        }
        // Retries a definitions fetch that failed earlier.
        if self.definitions_stale() && self.definitions_in_flight == 0 {
            self.spawn_definitions();
        }
    }

    fn on_resync_tick(&mut self) {
        if self.definitions_in_flight == 0 {
            self.spawn_definitions();
        }
    }

    fn apply_token(&mut self, seq: u64, result: Result<ChangeToken, FetchError>) {
        self.token_in_flight = false;

        let token = match result {
            Ok(token) => token,
            Err(err) => {
                tracing::debug!(code = err.code(), error = %err, "Token check failed");
                return;
            }
        };

        // A token read before the applied definitions were fetched says
        // nothing new. Tokens are not compared by value since a restarted
        // server counts from 1 again. If the newer definitions response
        // carried an older token, drift shows up one token tick later.
        if !self.token_gate.admit(seq) || seq < self.observed_seq {
            tracing::debug!(seq, token = token.0, "Discarded stale token response");
            return;
        }

        if self.applied_token.is_some_and(|applied| applied != token)
            && self.observed_token != Some(token)
        {
            tracing::info!(
                applied = ?self.applied_token.map(|t| t.0),
                observed = token.0,
                "Gauge definitions changed on server",
            );
        }
        self.observed_token = Some(token);
        self.observed_seq = seq;

        if self.definitions_stale() && self.definitions_in_flight == 0 {
            self.spawn_definitions();
        }
    }

    fn apply_definitions(&mut self, seq: u64, result: Result<DefinitionSet, FetchError>) {
        self.definitions_in_flight = self.definitions_in_flight.saturating_sub(1);

        match result {
            Err(err) => {
                // The next token tick retries while the definitions are stale.
                tracing::warn!(code = err.code(), error = %err, "Definitions fetch failed");
                return;
            }
            Ok(set) if self.definitions_gate.admit(seq) => {
                tracing::info!(
                    count = set.definitions.len(),
                    token = set.token.0,
                    "Gauge definitions applied",
                );
                self.definitions = set.definitions;
                self.applied_token = Some(set.token);
                if seq > self.observed_seq {
                    self.observed_token = Some(set.token);
                    self.observed_seq = seq;
                }
            }
            Ok(set) => {
                tracing::debug!(seq, token = set.token.0, "Discarded stale definitions response");
            }
        }

        // A token newer than these definitions was observed meanwhile.
        if self.definitions_stale() && self.definitions_in_flight == 0 {
            self.spawn_definitions();
        }
    }

    // ---- plumbing ----

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Values {
                seq,
                scheduled,
                result,
            } => self.apply_values(seq, scheduled, result),
            Outcome::Token { seq, result } => self.apply_token(seq, result),
            Outcome::Definitions { seq, result } => self.apply_definitions(seq, result),
        }
        self.publish();
    }

    fn spawn_values(&mut self, scheduled: bool) -> u64 {
        let seq = self.sequence.next();
        let source = Arc::clone(&self.source);
        let limit = self.config.request_timeout;
        self.tasks.spawn(async move {
            let result = bounded(limit, source.fetch_values()).await;
            Outcome::Values {
                seq,
                scheduled,
                result,
            }
        });
        seq
    }

    fn spawn_token(&mut self) {
        self.token_in_flight = true;
        let seq = self.sequence.next();
        let source = Arc::clone(&self.source);
        let limit = self.config.request_timeout;
        self.tasks.spawn(async move {
            let result = bounded(limit, source.fetch_token()).await;
            Outcome::Token { seq, result }
        });
    }

    fn spawn_definitions(&mut self) {
        self.definitions_in_flight += 1;
        let seq = self.sequence.next();
        let source = Arc::clone(&self.source);
        let limit = self.config.request_timeout;
        self.tasks.spawn(async move {
            let result = bounded(limit, source.fetch_definitions()).await;
            Outcome::Definitions { seq, result }
        });
    }

    fn snapshot(&self) -> PollerSnapshot {
        PollerSnapshot {
            definitions: self.definitions.clone(),
            applied_token: self.applied_token,
            observed_token: self.observed_token,
            config_changed: self.applied_token.is_some() && self.definitions_stale(),
            last_known_good: self.last_known_good,
            connection: self.connection.clone(),
            next_retry_at: if self.connection.connected {
                None
            } else {
                self.next_value_at
            },
            last_error: self.last_error.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Run `fetch`, turning an overrun of `limit` into [`FetchError::Timeout`].
async fn bounded<T>(
    limit: Duration,
    fetch: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    tokio::time::timeout(limit, fetch)
        .await
        .unwrap_or_else(|_| Err(FetchError::Timeout(limit)))
}
