//! Technical records and the input shapes accepted from collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::metric::{GaugeValueSet, MetricId};
use crate::types::{RecordId, Timestamp};

/// A raw sensor submission, stored immutably in the record log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalRecord {
    pub id: RecordId,
    pub temperature: f64,
    pub voltage: f64,
    pub pressure: f64,
    pub created_at: Timestamp,
}

/// Validated readings for a new record, before an id is assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordInput {
    pub temperature: f64,
    pub voltage: f64,
    pub pressure: f64,
}

/// Wire shape of `POST /records`. `null` reads as absent.
#[derive(Deserialize)]
struct RecordBody {
    temperature: Option<Value>,
    voltage: Option<Value>,
    pressure: Option<Value>,
}

impl RecordInput {
    /// Extract the three readings from a JSON body.
    ///
    /// Each field must be present and a JSON number. Extra fields are ignored.
    pub fn from_json(body: &Value) -> Result<Self, CoreError> {
        // Serde would also accept a `[t, v, p]` array for a struct.
        if !body.is_object() {
            return Err(CoreError::Validation("record must be a JSON object".to_string()));
        }
        let body = RecordBody::deserialize(body)
            .map_err(|e| CoreError::Validation(format!("invalid record: {e}")))?;

        let missing: Vec<&str> = [
            ("temperature", &body.temperature),
            ("voltage", &body.voltage),
            ("pressure", &body.pressure),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key)
        .collect();
        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "temperature, voltage and pressure are required (missing: {})",
                missing.join(", ")
            )));
        }

        Ok(Self {
            temperature: reading("temperature", body.temperature.as_ref())?,
            voltage: reading("voltage", body.voltage.as_ref())?,
            pressure: reading("pressure", body.pressure.as_ref())?,
        })
    }
}

/// A partial set of direct value replacements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueOverride {
    fields: Vec<(MetricId, f64)>,
}

impl ValueOverride {
    /// Parse a `{ metricId: number, ... }` object.
    ///
    /// Unknown keys and non-numeric values reject the whole override.
    pub fn from_json(body: &Value) -> Result<Self, CoreError> {
        let obj = body.as_object().ok_or_else(|| {
            CoreError::Validation("value override must be a JSON object".to_string())
        })?;

        let mut fields = Vec::with_capacity(obj.len());
        for key in obj.keys() {
            let id: MetricId = key.parse()?;
            fields.push((id, reading(key, obj.get(key))?));
        }
        Ok(Self { fields })
    }

    pub fn set(mut self, id: MetricId, value: f64) -> Self {
        self.fields.push((id, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[(MetricId, f64)] {
        &self.fields
    }

    pub(crate) fn apply_to(&self, values: &mut GaugeValueSet) {
        for &(id, value) in &self.fields {
            values.set(id, value);
        }
    }
}

fn reading(key: &str, value: Option<&Value>) -> Result<f64, CoreError> {
    value
        .and_then(Value::as_f64)
        .ok_or_else(|| CoreError::Validation(format!("{key} must be a number")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_numeric_record() {
        let input = RecordInput::from_json(&json!({
            "temperature": 95,
            "voltage": 195.5,
            "pressure": 5,
            "operator": "ignored"
        }))
        .unwrap();
        assert_eq!(input.temperature, 95.0);
        assert_eq!(input.voltage, 195.5);
        assert_eq!(input.pressure, 5.0);
    }

    #[test]
    fn rejects_missing_fields() {
        let err = RecordInput::from_json(&json!({ "temperature": 20 })).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("voltage, pressure"));
    }

    #[test]
    fn null_counts_as_missing() {
        let err =
            RecordInput::from_json(&json!({ "temperature": null, "voltage": 1, "pressure": 1 }))
                .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("temperature"));
    }

    #[test]
    fn rejects_numeric_strings() {
        let err =
            RecordInput::from_json(&json!({ "temperature": "20", "voltage": 1, "pressure": 1 }))
                .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "temperature must be a number");
    }

    #[test]
    fn rejects_non_object_record() {
        let err = RecordInput::from_json(&json!([95, 195, 5])).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "record must be a JSON object");
    }

    #[test]
    fn override_accepts_known_metrics() {
        let ov = ValueOverride::from_json(&json!({ "fuel": 40, "kva": 12.5 })).unwrap();
        assert_eq!(ov.fields().len(), 2);
        assert!(ov.fields().contains(&(MetricId::Fuel, 40.0)));
        assert!(ov.fields().contains(&(MetricId::Kva, 12.5)));
    }

    #[test]
    fn override_rejects_unknown_metric() {
        let err = ValueOverride::from_json(&json!({ "fuel": 40, "rpm": 900 })).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("rpm"));
    }

    #[test]
    fn override_rejects_non_numeric_value() {
        let err = ValueOverride::from_json(&json!({ "fuel": true })).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "fuel must be a number");
    }
}
