//! Persistence port consumed by the orchestrator and the telemetry collector.
//!
//! The relational store lives outside this crate; [`InMemoryTelemetryStore`]
//! is the reference implementation used by the binary and the tests.

pub mod memory;
pub mod seed;

pub use memory::InMemoryTelemetryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ComplianceCheck, Scenario, ScenarioId, Turbine, TurbineId, TurbineMeasurement, WeatherSample,
};
use crate::error::SinkError;

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Rows removed by a retention purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub weather: usize,
    pub measurements: usize,
    pub compliance_checks: usize,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.weather + self.measurements + self.compliance_checks
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn list_turbines(&self) -> SinkResult<Vec<Turbine>>;
    async fn get_active_scenario(&self) -> SinkResult<Option<Scenario>>;
    async fn list_scenarios(&self) -> SinkResult<Vec<Scenario>>;
    /// Deactivate every scenario and activate `id` in one atomic update.
    /// Returns `false` (and changes nothing) when `id` is unknown.
    async fn activate_scenario(&self, id: ScenarioId) -> SinkResult<bool>;
    async fn save_weather(&self, sample: &WeatherSample) -> SinkResult<()>;
    async fn save_measurement(&self, record: &TurbineMeasurement) -> SinkResult<()>;
    async fn save_compliance_check(&self, record: &ComplianceCheck) -> SinkResult<()>;
    async fn latest_weather(&self) -> SinkResult<Option<WeatherSample>>;
    async fn latest_measurement(
        &self,
        turbine_id: TurbineId,
    ) -> SinkResult<Option<TurbineMeasurement>>;
    /// Delete weather, measurements and compliance checks older than `cutoff`.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> SinkResult<PurgeReport>;
}
