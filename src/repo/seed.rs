//! Default fleet and scenario catalogue for a fresh installation.

use super::InMemoryTelemetryStore;
use crate::domain::{Scenario, ScenarioParameters, ScenarioType, Turbine, TurbineStatus};

/// Rated power of the reference 3.05 MW turbine
pub const REFERENCE_RATING_W: f64 = 3.05e6;

pub fn default_turbines() -> Vec<Turbine> {
    (1..=5u32)
        .map(|i| {
            let status = if i == 4 {
                TurbineStatus::Maintenance
            } else {
                TurbineStatus::Operational
            };
            let offset = f64::from(i - 1);
            Turbine::new(i, format!("Turbine {i}"), REFERENCE_RATING_W)
                .with_status(status)
                .with_location(52.2297 + offset * 0.0001, 21.0122 + offset * 0.0002)
        })
        .collect()
}

pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(1, "Normal Operation", ScenarioType::NormalOperation)
            .with_description("Normal wind farm operation with typical wind conditions")
            .activated(),
        Scenario::new(2, "Grid Fault", ScenarioType::GridFault)
            .with_description("Grid fault with voltage dip")
            .with_parameters(
                ScenarioParameters::new()
                    .with("voltage", 0.7)
                    .with("duration", 0.2),
            ),
        Scenario::new(3, "Turbine Failure", ScenarioType::TurbineFailure)
            .with_description("Mechanical failure in a specific turbine")
            .with_parameters(ScenarioParameters::new().with("turbine_id", 3)),
        Scenario::new(4, "Storm Conditions", ScenarioType::Storm)
            .with_description("Storm conditions with high wind speeds")
            .with_parameters(ScenarioParameters::new().with("wind_speed", 20.0)),
    ]
}

impl InMemoryTelemetryStore {
    /// Store pre-populated with the default fleet and scenarios
    pub fn seeded() -> Self {
        Self::with_fleet(default_turbines(), default_scenarios())
    }
}
