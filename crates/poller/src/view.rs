//! Reconciles definitions, last-known-good values and connection status into
//! what a dashboard draws.

use std::fmt;
use std::time::Duration;

use gaugewatch_core::definition::GaugeDefinition;
use gaugewatch_core::metric::GaugeValueSet;
use serde::Serialize;
use tokio::time::Instant;

use crate::connection::ConnectionState;
use crate::poller::PollerSnapshot;

/// Where a displayed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Last-known-good value while connected.
    Live,
    /// Last-known-good value during an outage.
    Stale,
    /// The definition's `initialValue`; no value observed for this gauge.
    Initial,
}

/// One gauge, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeDisplay {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub start_color: String,
    pub end_color: String,
    /// Value exactly as reported.
    pub value: f64,
    /// `value` clamped into `[min, max]`.
    pub display_value: f64,
    pub out_of_range: bool,
    pub source: ValueSource,
    pub offline: bool,
}

/// Build one [`GaugeDisplay`] per definition, in definition order.
pub fn render(
    definitions: &[GaugeDefinition],
    last_known_good: Option<&GaugeValueSet>,
    connection: &ConnectionState,
) -> Vec<GaugeDisplay> {
    let offline = !connection.connected;

    definitions
        .iter()
        .map(|def| {
            let observed = last_known_good.and_then(|values| values.lookup(&def.id));
            let (value, source) = match observed {
                Some(value) if offline => (value, ValueSource::Stale),
                Some(value) => (value, ValueSource::Live),
                None => (def.initial_value, ValueSource::Initial),
            };

            GaugeDisplay {
                id: def.id.clone(),
                name: def.name.clone(),
                unit: def.unit.clone(),
                min: def.min,
                max: def.max,
                start_color: def.start_color.clone(),
                end_color: def.end_color.clone(),
                value,
                // Must not panic when min > max.
                display_value: value.max(def.min).min(def.max),
                out_of_range: value < def.min || value > def.max,
                source,
                offline,
            }
        })
        .collect()
}

/// Outage summary shown above the gauges while disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectBanner {
    pub disconnected_for: Duration,
    /// Consecutive failed value polls.
    pub retry_count: u32,
    /// Time until the next retry; `None` while a retry is in flight.
    pub next_retry_in: Option<Duration>,
    pub last_error_code: Option<&'static str>,
}

impl DisconnectBanner {
    /// `None` while connected.
    pub fn from_snapshot(snapshot: &PollerSnapshot, now: Instant) -> Option<Self> {
        if snapshot.connection.connected {
            return None;
        }

        Some(Self {
            disconnected_for: snapshot
                .connection
                .disconnected_for(now)
                .unwrap_or_default(),
            retry_count: snapshot.connection.failure_count,
            next_retry_in: snapshot
                .next_retry_at
                .map(|at| at.saturating_duration_since(now)),
            last_error_code: snapshot.last_error.as_ref().map(|e| e.code()),
        })
    }

    /// Outage duration as `m:ss`.
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.disconnected_for)
    }
}

impl fmt::Display for DisconnectBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection lost {} ago, {} failed attempts",
            self.elapsed_label(),
            self.retry_count
        )?;
        match self.next_retry_in {
            Some(eta) => write!(f, ", retrying in {:.1}s", eta.as_secs_f64())?,
            None => write!(f, ", retrying now")?,
        }
        if let Some(code) = self.last_error_code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

fn format_elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use gaugewatch_core::definition::default_definitions;

    use super::*;
    use crate::source::{FetchError, ValuesSnapshot};

    fn find<'a>(gauges: &'a [GaugeDisplay], id: &str) -> &'a GaugeDisplay {
        gauges.iter().find(|g| g.id == id).unwrap()
    }

    #[test]
    fn renders_one_entry_per_definition_in_order() {
        let defs = default_definitions();
        let gauges = render(&defs, None, &ConnectionState::default());

        let ids: Vec<&str> = gauges.iter().map(|g| g.id.as_str()).collect();
        let expected: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn falls_back_to_initial_value_before_first_poll() {
        let gauges = render(&default_definitions(), None, &ConnectionState::default());

        let fuel = find(&gauges, "fuel");
        assert_eq!(fuel.value, 70.0);
        assert_eq!(fuel.source, ValueSource::Initial);
        assert!(!fuel.offline);
    }

    #[test]
    fn clamps_display_value_and_flags_out_of_range() {
        let values = GaugeValueSet {
            voltage: 250.0,
            temperature: -40.0,
            ..GaugeValueSet::default()
        };
        let gauges = render(&default_definitions(), Some(&values), &ConnectionState::default());

        let voltage = find(&gauges, "voltage");
        assert_eq!(voltage.value, 250.0);
        assert_eq!(voltage.display_value, 240.0);
        assert!(voltage.out_of_range);
        assert_eq!(voltage.source, ValueSource::Live);

        let temperature = find(&gauges, "temperature");
        assert_eq!(temperature.display_value, -30.0);
        assert!(temperature.out_of_range);

        assert!(!find(&gauges, "fuel").out_of_range);
    }

    #[test]
    fn custom_gauges_use_initial_value() {
        let defs = vec![GaugeDefinition::new("rpm", "RPM", "rpm", 0.0, 8000.0).with_initial_value(900.0)];
        let gauges = render(&defs, Some(&GaugeValueSet::default()), &ConnectionState::default());

        assert_eq!(gauges[0].value, 900.0);
        assert_eq!(gauges[0].source, ValueSource::Initial);
    }

    #[test]
    fn offline_values_are_marked_stale() {
        let mut connection = ConnectionState::default();
        connection.on_failure(Instant::now());

        let gauges = render(&default_definitions(), Some(&GaugeValueSet::default()), &connection);

        assert!(gauges.iter().all(|g| g.offline));
        assert_eq!(find(&gauges, "kva").source, ValueSource::Stale);
        assert_eq!(find(&gauges, "kva").value, 100.0);
    }

    #[test]
    fn banner_absent_while_connected() {
        let snapshot = PollerSnapshot::default();
        assert_eq!(DisconnectBanner::from_snapshot(&snapshot, Instant::now()), None);
    }

    #[test]
    fn banner_reports_outage_details() {
        let start = Instant::now();
        let mut connection = ConnectionState::default();
        connection.on_failure(start);
        connection.on_failure(start);
        connection.on_failure(start);

        let snapshot = PollerSnapshot {
            connection,
            next_retry_at: Some(start + Duration::from_secs(67)),
            last_error: Some(FetchError::Timeout(Duration::from_millis(1500))),
            last_known_good: Some(ValuesSnapshot {
                values: GaugeValueSet::default(),
                timestamp: chrono::Utc::now(),
            }),
            ..PollerSnapshot::default()
        };

        let banner = DisconnectBanner::from_snapshot(&snapshot, start + Duration::from_secs(65))
            .unwrap();
        assert_eq!(banner.elapsed_label(), "1:05");
        assert_eq!(banner.retry_count, 3);
        assert_eq!(banner.next_retry_in, Some(Duration::from_secs(2)));
        assert_eq!(banner.last_error_code, Some("CONN_TIMEOUT"));
        assert_eq!(
            banner.to_string(),
            "Connection lost 1:05 ago, 3 failed attempts, retrying in 2.0s [CONN_TIMEOUT]"
        );
    }

    #[test]
    fn elapsed_label_pads_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00");
        assert_eq!(format_elapsed(Duration::from_secs(9)), "0:09");
        assert_eq!(format_elapsed(Duration::from_secs(600)), "10:00");
    }
}
