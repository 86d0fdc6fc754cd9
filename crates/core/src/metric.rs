//! Metric identifiers and the process-wide gauge value set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The closed set of gauge metrics the derivation rules know about.
///
/// The string form (used in JSON and as `GaugeDefinition::id`) is camelCase,
/// e.g. `oilPressure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricId {
    Temperature,
    Voltage,
    OilPressure,
    Fuel,
    Current,
    BatteryLevel,
    HoursOfUse,
    OperatingHours,
    Kva,
}

impl MetricId {
    /// Every metric, in the order they appear in [`GaugeValueSet`].
    pub const ALL: [MetricId; 9] = [
        MetricId::Temperature,
        MetricId::Voltage,
        MetricId::OilPressure,
        MetricId::Fuel,
        MetricId::Current,
        MetricId::BatteryLevel,
        MetricId::HoursOfUse,
        MetricId::OperatingHours,
        MetricId::Kva,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricId::Temperature => "temperature",
            MetricId::Voltage => "voltage",
            MetricId::OilPressure => "oilPressure",
            MetricId::Fuel => "fuel",
            MetricId::Current => "current",
            MetricId::BatteryLevel => "batteryLevel",
            MetricId::HoursOfUse => "hoursOfUse",
            MetricId::OperatingHours => "operatingHours",
            MetricId::Kva => "kva",
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown metric '{s}'")))
    }
}

/// Current value of every gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeValueSet {
    pub temperature: f64,
    pub voltage: f64,
    pub oil_pressure: f64,
    pub fuel: f64,
    pub current: f64,
    pub battery_level: f64,
    pub hours_of_use: f64,
    pub operating_hours: f64,
    pub kva: f64,
}

impl Default for GaugeValueSet {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            voltage: 220.0,
            oil_pressure: 4.0,
            fuel: 75.0,
            current: 10.0,
            battery_level: 90.0,
            hours_of_use: 120.0,
            operating_hours: 80.0,
            kva: 100.0,
        }
    }
}

impl GaugeValueSet {
    pub fn get(&self, id: MetricId) -> f64 {
        match id {
            MetricId::Temperature => self.temperature,
            MetricId::Voltage => self.voltage,
            MetricId::OilPressure => self.oil_pressure,
            MetricId::Fuel => self.fuel,
            MetricId::Current => self.current,
            MetricId::BatteryLevel => self.battery_level,
            MetricId::HoursOfUse => self.hours_of_use,
            MetricId::OperatingHours => self.operating_hours,
            MetricId::Kva => self.kva,
        }
    }

    pub fn set(&mut self, id: MetricId, value: f64) {
        let slot = match id {
            MetricId::Temperature => &mut self.temperature,
            MetricId::Voltage => &mut self.voltage,
            MetricId::OilPressure => &mut self.oil_pressure,
            MetricId::Fuel => &mut self.fuel,
            MetricId::Current => &mut self.current,
            MetricId::BatteryLevel => &mut self.battery_level,
            MetricId::HoursOfUse => &mut self.hours_of_use,
            MetricId::OperatingHours => &mut self.operating_hours,
            MetricId::Kva => &mut self.kva,
        };
        *slot = value;
    }

    /// Look up a value by its string id. Returns `None` for ids that are not
    /// metrics (definitions may carry arbitrary ids).
    pub fn lookup(&self, id: &str) -> Option<f64> {
        id.parse::<MetricId>().ok().map(|m| self.get(m))
    }

    /// The first metric holding a NaN or infinite value, if any.
    pub fn first_non_finite(&self) -> Option<MetricId> {
        MetricId::ALL.into_iter().find(|&m| !self.get(m).is_finite())
    }
}
