use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::TurbineId;

/// Per-turbine telemetry derived once per step. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineMeasurement {
    pub turbine_id: TurbineId,
    pub timestamp: DateTime<Utc>,
    /// Electrical power output in W (>= 0)
    pub power_output_w: f64,
    /// Wind speed used for the computation in m/s
    pub wind_speed_ms: f64,
    /// Rotor speed in rpm, [0, 15]
    pub rotor_speed_rpm: f64,
    /// Blade pitch in degrees, [0, 45]
    pub blade_pitch_deg: f64,
    /// Nacelle orientation in degrees
    pub nacelle_orientation_deg: f64,
    pub grid_voltage_v: f64,
    pub grid_frequency_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplianceCheckType {
    Lvrt,
    Hvrt,
    Frequency,
    ReactivePower,
}

/// Outcome of a grid-code evaluation, before it is attributed to a turbine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceOutcome {
    pub check_type: ComplianceCheckType,
    pub compliant: bool,
    pub voltage_pu: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub duration_s: Option<f64>,
    /// Supporting detail, always including the computed threshold
    pub details: Map<String, Value>,
}

impl ComplianceOutcome {
    /// Numeric detail lookup, e.g. `max_allowed_duration`.
    pub fn detail_f64(&self, key: &str) -> Option<f64> {
        self.details.get(key).and_then(Value::as_f64)
    }

    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}

/// Persisted compliance record. Created only when a grid event triggers evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub turbine_id: TurbineId,
    pub timestamp: DateTime<Utc>,
    pub check_type: ComplianceCheckType,
    pub voltage_pu: Option<f64>,
    pub frequency_hz: Option<f64>,
    pub duration_s: Option<f64>,
    pub compliant: bool,
    pub details: Map<String, Value>,
}

impl ComplianceCheck {
    pub fn from_outcome(
        turbine_id: TurbineId,
        timestamp: DateTime<Utc>,
        outcome: ComplianceOutcome,
    ) -> Self {
        Self {
            turbine_id,
            timestamp,
            check_type: outcome.check_type,
            voltage_pu: outcome.voltage_pu,
            frequency_hz: outcome.frequency_hz,
            duration_s: outcome.duration_s,
            compliant: outcome.compliant,
            details: outcome.details,
        }
    }
}
