//! Derivation store: current gauge values and the technical-record log.
//!
//! Every mutation (record submission or override) runs as a single critical
//! section over a working copy of the [`GaugeValueSet`]. The copy is committed
//! only if every derived value is finite, so readers see either the previous
//! set or the fully-updated one.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;

use crate::error::CoreError;
use crate::jitter::JitterSource;
use crate::metric::GaugeValueSet;
use crate::record::{RecordInput, TechnicalRecord, ValueOverride};
use crate::types::Timestamp;

/// Temperature above which each record burns fuel.
pub const FUEL_BURN_TEMPERATURE: f64 = 90.0;
/// Fuel consumed per hot record.
pub const FUEL_BURN_STEP: f64 = 2.0;
/// Hours added to `hoursOfUse` and `operatingHours` per record.
pub const HOURS_PER_RECORD: f64 = 0.1;
/// Voltage below which the battery drains.
pub const BATTERY_DRAIN_VOLTAGE: f64 = 200.0;
pub const BATTERY_DRAIN_STEP: f64 = 1.0;
pub const BATTERY_CHARGE_STEP: f64 = 0.5;
/// Floor for a draining battery.
pub const BATTERY_MIN_LEVEL: f64 = 10.0;
pub const BATTERY_MAX_LEVEL: f64 = 100.0;

/// Result of an accepted record submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedRecord {
    pub record: TechnicalRecord,
    pub values: GaugeValueSet,
}

/// A point-in-time read of the value set.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ValuesReading {
    pub values: GaugeValueSet,
    pub timestamp: Timestamp,
}

struct StoreState {
    values: GaugeValueSet,
    records: VecDeque<TechnicalRecord>,
}

/// Owner of the process-wide [`GaugeValueSet`] and the record log.
pub struct DerivationStore {
    state: Mutex<StoreState>,
    jitter: Box<dyn JitterSource>,
    /// Maximum number of records kept; `None` keeps every record.
    retention: Option<usize>,
}

impl DerivationStore {
    pub fn new(jitter: Box<dyn JitterSource>) -> Self {
        Self::with_values(GaugeValueSet::default(), jitter)
    }

    /// Start from an explicit baseline instead of the defaults.
    pub fn with_values(values: GaugeValueSet, jitter: Box<dyn JitterSource>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                values,
                records: VecDeque::new(),
            }),
            jitter,
            retention: None,
        }
    }

    /// Cap the record log, evicting the oldest entries first.
    pub fn with_retention(mut self, retention: Option<usize>) -> Self {
        self.retention = retention;
        self
    }

    /// Store a new record and apply the derivation rules.
    pub fn submit_record(&self, input: RecordInput) -> Result<SubmittedRecord, CoreError> {
        let mut state = self.lock()?;

        let mut next = state.values;
        derive(&mut next, &input, self.jitter.sample());
        if let Some(metric) = next.first_non_finite() {
            return Err(CoreError::Internal(format!(
                "derivation produced a non-finite {metric}"
            )));
        }

        let record = TechnicalRecord {
            id: uuid::Uuid::now_v7(),
            temperature: input.temperature,
            voltage: input.voltage,
            pressure: input.pressure,
            created_at: Utc::now(),
        };

        state.values = next;
        state.records.push_back(record.clone());
        if let Some(limit) = self.retention {
            while state.records.len() > limit {
                state.records.pop_front();
            }
        }

        Ok(SubmittedRecord {
            record,
            values: next,
        })
    }

    /// Replace the supplied values directly, bypassing the derivation rules.
    pub fn override_values(&self, patch: &ValueOverride) -> Result<ValuesReading, CoreError> {
        let mut state = self.lock()?;

        let mut next = state.values;
        patch.apply_to(&mut next);
        if let Some(metric) = next.first_non_finite() {
            return Err(CoreError::Validation(format!("{metric} must be finite")));
        }

        state.values = next;
        Ok(ValuesReading {
            values: next,
            timestamp: Utc::now(),
        })
    }

    pub fn read_values(&self) -> Result<ValuesReading, CoreError> {
        let state = self.lock()?;
        Ok(ValuesReading {
            values: state.values,
            timestamp: Utc::now(),
        })
    }

    /// Records in submission order. `limit` keeps only the newest entries.
    pub fn list_records(&self, limit: Option<usize>) -> Result<Vec<TechnicalRecord>, CoreError> {
        let state = self.lock()?;
        let skip = limit.map_or(0, |l| state.records.len().saturating_sub(l));
        Ok(state.records.iter().skip(skip).cloned().collect())
    }

    pub fn record_count(&self) -> Result<usize, CoreError> {
        Ok(self.lock()?.records.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Internal("derivation store lock poisoned".to_string()))
    }
}

/// Apply the fixed rule set for one record to `values`.
fn derive(values: &mut GaugeValueSet, input: &RecordInput, jitter: f64) {
    values.temperature = input.temperature;
    values.voltage = input.voltage;
    values.oil_pressure = input.pressure;

    if input.temperature > FUEL_BURN_TEMPERATURE {
        values.fuel = (values.fuel - FUEL_BURN_STEP).max(0.0);
    }

    values.hours_of_use += HOURS_PER_RECORD;
    values.operating_hours += HOURS_PER_RECORD;

    values.current = input.voltage / 20.0 + jitter;
    values.kva = values.current * input.voltage / 1000.0;

    values.battery_level = if input.voltage < BATTERY_DRAIN_VOLTAGE {
        (values.battery_level - BATTERY_DRAIN_STEP).max(BATTERY_MIN_LEVEL)
    } else {
        (values.battery_level + BATTERY_CHARGE_STEP).min(BATTERY_MAX_LEVEL)
    };
}
