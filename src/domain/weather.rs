use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One synthesized weather observation, shared by every turbine in a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    /// Wind speed in m/s (>= 0)
    pub wind_speed_ms: f64,
    /// Wind direction in degrees, [0, 360)
    pub wind_direction_deg: f64,
    /// Air temperature in °C
    pub temperature_c: f64,
    /// Atmospheric pressure in hPa
    pub pressure_hpa: f64,
    /// Relative humidity in %, [0, 100]
    pub humidity_percent: f64,
}
