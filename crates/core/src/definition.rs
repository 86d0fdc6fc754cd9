//! Gauge definitions and the change token.
//!
//! The [`DefinitionRegistry`] owns the ordered list of [`GaugeDefinition`]s.
//! Every mutation bumps a [`ChangeToken`] so that clients can detect
//! configuration drift with a single cheap read ([`DefinitionRegistry::check_token`]).

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::metric::GaugeValueSet;

/// Monotonic counter identifying a registry revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeToken(pub u64);

/// Display metadata for one gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_bounds"))]
pub struct GaugeDefinition {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 16))]
    pub unit: String,
    pub min: f64,
    pub max: f64,
    #[validate(custom(function = "validate_hex_color"))]
    pub start_color: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub end_color: String,
    pub initial_value: f64,
}

fn validate_bounds(def: &GaugeDefinition) -> Result<(), ValidationError> {
    if !def.min.is_finite() || !def.max.is_finite() || !def.initial_value.is_finite() {
        return Err(ValidationError::new("non_finite")
            .with_message(format!("gauge '{}' has a non-finite bound or initial value", def.id).into()));
    }
    if def.min >= def.max {
        return Err(ValidationError::new("min_not_below_max").with_message(
            format!("gauge '{}': min ({}) must be less than max ({})", def.id, def.min, def.max)
                .into(),
        ));
    }
    Ok(())
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    let hex = value.strip_prefix('#').unwrap_or_default();
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color")
            .with_message(format!("'{value}' is not a #rrggbb color").into()))
    }
}

impl GaugeDefinition {
    pub fn new(id: &str, name: &str, unit: &str, min: f64, max: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
            min,
            max,
            start_color: "#5a5d6d".to_string(),
            end_color: "#4287f5".to_string(),
            initial_value: min,
        }
    }

    pub fn with_colors(mut self, start: &str, end: &str) -> Self {
        self.start_color = start.to_string();
        self.end_color = end.to_string();
        self
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }
}

/// The definitions the server starts with.
pub fn default_definitions() -> Vec<GaugeDefinition> {
    vec![
        GaugeDefinition::new("fuel", "Fuel Level", "%", 0.0, 100.0)
            .with_colors("#5a5d6d", "#4287f5")
            .with_initial_value(70.0),
        GaugeDefinition::new("voltage", "Voltage", "V", 190.0, 240.0)
            .with_colors("#5a6d68", "#00fabb")
            .with_initial_value(230.0),
        GaugeDefinition::new("temperature", "Temperature", "°C", -30.0, 120.0)
            .with_colors("#6d5a5a", "#ff7b00")
            .with_initial_value(85.0),
        GaugeDefinition::new("oilPressure", "Oil Pressure", "Bar", 0.0, 10.0)
            .with_colors("#5a6d64", "#00fab0")
            .with_initial_value(4.2),
        GaugeDefinition::new("current", "Current", "A", 0.0, 100.0)
            .with_colors("#6d625a", "#ff9f00")
            .with_initial_value(15.0),
        GaugeDefinition::new("batteryLevel", "Battery Level", "%", 0.0, 100.0)
            .with_colors("#5a6a6d", "#00e1ff")
            .with_initial_value(80.0),
        GaugeDefinition::new("hoursOfUse", "Hours of Use", "h", 0.0, 9999.0)
            .with_colors("#665a6d", "#d600ff")
            .with_initial_value(250.0),
        GaugeDefinition::new("operatingHours", "Operating Hours", "h", 0.0, 9999.0)
            .with_colors("#6d5a69", "#ff00aa")
            .with_initial_value(130.0),
        GaugeDefinition::new("kva", "kVA", "kVA", 0.0, 500.0)
            .with_colors("#5a676d", "#00c3ff")
            .with_initial_value(120.0),
    ]
}

/// Definitions together with the token of the revision they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionSet {
    pub definitions: Vec<GaugeDefinition>,
    pub token: ChangeToken,
}

/// Owner of the gauge definitions and their change token.
pub struct DefinitionRegistry {
    definitions: RwLock<Vec<GaugeDefinition>>,
    /// Only bumped while the write lock is held.
    token: AtomicU64,
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new(default_definitions())
    }
}

impl DefinitionRegistry {
    /// Create a registry without validating `definitions`.
    pub fn new(definitions: Vec<GaugeDefinition>) -> Self {
        Self {
            definitions: RwLock::new(definitions),
            token: AtomicU64::new(1),
        }
    }

    /// Current definitions and their token, read consistently.
    pub fn list(&self) -> Result<DefinitionSet, CoreError> {
        let defs = self.read()?;
        Ok(DefinitionSet {
            definitions: defs.clone(),
            token: self.check_token(),
        })
    }

    /// Current change token; lock-free and side-effect free.
    pub fn check_token(&self) -> ChangeToken {
        ChangeToken(self.token.load(Ordering::Acquire))
    }

    /// Replace every definition. Invalid input leaves the registry and token
    /// untouched.
    pub fn replace_all(&self, definitions: Vec<GaugeDefinition>) -> Result<DefinitionSet, CoreError> {
        validate_definitions(&definitions)?;

        let mut defs = self.write()?;
        *defs = definitions;
        let token = self.bump();
        Ok(DefinitionSet {
            definitions: defs.clone(),
            token,
        })
    }

    /// Set `initial_value` from `values` for every definition that names a
    /// known metric.
    pub fn sync_initial_from_current(&self, values: &GaugeValueSet) -> Result<DefinitionSet, CoreError> {
        let mut defs = self.write()?;
        for def in defs.iter_mut() {
            if let Some(current) = values.lookup(&def.id) {
                def.initial_value = current;
            }
        }
        let token = self.bump();
        Ok(DefinitionSet {
            definitions: defs.clone(),
            token,
        })
    }

    /// Advance the token without changing any definition, forcing clients to
    /// reload.
    pub fn touch(&self) -> Result<ChangeToken, CoreError> {
        let _defs = self.write()?;
        Ok(self.bump())
    }

    fn bump(&self) -> ChangeToken {
        ChangeToken(self.token.fetch_add(1, Ordering::AcqRel) + 1)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<GaugeDefinition>>, CoreError> {
        self.definitions
            .read()
            .map_err(|_| CoreError::Internal("definition registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<GaugeDefinition>>, CoreError> {
        self.definitions
            .write()
            .map_err(|_| CoreError::Internal("definition registry lock poisoned".to_string()))
    }
}

/// Validate every definition and reject duplicate ids.
pub fn validate_definitions(definitions: &[GaugeDefinition]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(definitions.len());
    for def in definitions {
        def.validate()?;
        if !seen.insert(def.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "duplicate gauge id '{}'",
                def.id
            )));
        }
    }
    Ok(())
}
