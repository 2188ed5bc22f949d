use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Grid disturbance kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GridEventKind {
    /// Voltage below nominal, magnitude in p.u.
    VoltageDip,
    /// Voltage above nominal, magnitude in p.u.
    VoltageSwell,
    /// Frequency outside nominal, magnitude in Hz
    FrequencyExcursion,
}

/// Step-scoped grid disturbance derived from the active scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridEvent {
    pub kind: GridEventKind,
    /// Voltage in p.u. for dips and swells, frequency in Hz for excursions
    pub magnitude: f64,
    /// Event duration in seconds
    pub duration_s: f64,
}

impl GridEvent {
    pub fn voltage_dip(voltage_pu: f64, duration_s: f64) -> Self {
        Self {
            kind: GridEventKind::VoltageDip,
            magnitude: voltage_pu,
            duration_s,
        }
    }

    pub fn voltage_swell(voltage_pu: f64, duration_s: f64) -> Self {
        Self {
            kind: GridEventKind::VoltageSwell,
            magnitude: voltage_pu,
            duration_s,
        }
    }

    pub fn frequency_excursion(frequency_hz: f64, duration_s: f64) -> Self {
        Self {
            kind: GridEventKind::FrequencyExcursion,
            magnitude: frequency_hz,
            duration_s,
        }
    }

    /// Voltage seen at the point of connection in p.u.
    pub fn voltage_pu(&self) -> Option<f64> {
        match self.kind {
            GridEventKind::VoltageDip | GridEventKind::VoltageSwell => Some(self.magnitude),
            GridEventKind::FrequencyExcursion => None,
        }
    }

    pub fn frequency_hz(&self) -> Option<f64> {
        match self.kind {
            GridEventKind::FrequencyExcursion => Some(self.magnitude),
            _ => None,
        }
    }
}
