use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{PurgeReport, SinkResult, TelemetrySink};
use crate::domain::{
    ComplianceCheck, Scenario, ScenarioId, Turbine, TurbineId, TurbineMeasurement,
    TurbineStatus, WeatherSample,
};
use crate::error::SinkError;

#[derive(Debug, Default)]
struct Tables {
    turbines: BTreeMap<TurbineId, Turbine>,
    scenarios: BTreeMap<ScenarioId, Scenario>,
    weather: Vec<WeatherSample>,
    measurements: Vec<TurbineMeasurement>,
    compliance_checks: Vec<ComplianceCheck>,
}

/// Process-local telemetry store.
///
/// All tables sit behind one lock, so scenario activation is atomic and
/// readers never observe two active scenarios.
#[derive(Debug, Default)]
pub struct InMemoryTelemetryStore {
    tables: RwLock<Tables>,
}

impl InMemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fleet(turbines: Vec<Turbine>, scenarios: Vec<Scenario>) -> Self {
        let store = Self::new();
        for turbine in turbines {
            store.upsert_turbine(turbine);
        }
        for scenario in scenarios {
            store.upsert_scenario(scenario);
        }
        store
    }

    pub fn upsert_turbine(&self, turbine: Turbine) {
        self.tables.write().turbines.insert(turbine.id, turbine);
    }

    pub fn remove_turbine(&self, id: TurbineId) -> Option<Turbine> {
        self.tables.write().turbines.remove(&id)
    }

    /// Management action: change a turbine's operating status
    pub fn set_turbine_status(&self, id: TurbineId, status: TurbineStatus) -> SinkResult<()> {
        let mut tables = self.tables.write();
        let turbine = tables
            .turbines
            .get_mut(&id)
            .ok_or(SinkError::UnknownTurbine(id))?;
        turbine.status = status;
        Ok(())
    }

    /// Insert or replace a scenario. Inserting an active scenario deactivates the others.
    pub fn upsert_scenario(&self, scenario: Scenario) {
        let mut tables = self.tables.write();
        if scenario.active {
            for other in tables.scenarios.values_mut() {
                other.active = false;
            }
        }
        tables.scenarios.insert(scenario.id, scenario);
    }

    pub fn weather_samples(&self) -> Vec<WeatherSample> {
        self.tables.read().weather.clone()
    }

    pub fn measurements(&self) -> Vec<TurbineMeasurement> {
        self.tables.read().measurements.clone()
    }

    pub fn compliance_checks(&self) -> Vec<ComplianceCheck> {
        self.tables.read().compliance_checks.clone()
    }
}

#[async_trait]
impl TelemetrySink for InMemoryTelemetryStore {
    async fn list_turbines(&self) -> SinkResult<Vec<Turbine>> {
        Ok(self.tables.read().turbines.values().cloned().collect())
    }

    async fn get_active_scenario(&self) -> SinkResult<Option<Scenario>> {
        Ok(self
            .tables
            .read()
            .scenarios
            .values()
            .find(|s| s.active)
            .cloned())
    }

    async fn list_scenarios(&self) -> SinkResult<Vec<Scenario>> {
        Ok(self.tables.read().scenarios.values().cloned().collect())
    }

    async fn activate_scenario(&self, id: ScenarioId) -> SinkResult<bool> {
        let mut tables = self.tables.write();
        if !tables.scenarios.contains_key(&id) {
            return Ok(false);
        }
        for (scenario_id, scenario) in tables.scenarios.iter_mut() {
            scenario.active = *scenario_id == id;
        }
        Ok(true)
    }

    async fn save_weather(&self, sample: &WeatherSample) -> SinkResult<()> {
        self.tables.write().weather.push(sample.clone());
        Ok(())
    }

    async fn save_measurement(&self, record: &TurbineMeasurement) -> SinkResult<()> {
        let mut tables = self.tables.write();
        if !tables.turbines.contains_key(&record.turbine_id) {
            return Err(SinkError::UnknownTurbine(record.turbine_id));
        }
        tables.measurements.push(record.clone());
        Ok(())
    }

    async fn save_compliance_check(&self, record: &ComplianceCheck) -> SinkResult<()> {
        let mut tables = self.tables.write();
        if !tables.turbines.contains_key(&record.turbine_id) {
            return Err(SinkError::UnknownTurbine(record.turbine_id));
        }
        tables.compliance_checks.push(record.clone());
        Ok(())
    }

    async fn latest_weather(&self) -> SinkResult<Option<WeatherSample>> {
        Ok(self
            .tables
            .read()
            .weather
            .iter()
            .max_by_key(|w| w.timestamp)
            .cloned())
    }

    async fn latest_measurement(
        &self,
        turbine_id: TurbineId,
    ) -> SinkResult<Option<TurbineMeasurement>> {
        Ok(self
            .tables
            .read()
            .measurements
            .iter()
            .filter(|m| m.turbine_id == turbine_id)
            .max_by_key(|m| m.timestamp)
            .cloned())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> SinkResult<PurgeReport> {
        let mut tables = self.tables.write();
        let before = (
            tables.weather.len(),
            tables.measurements.len(),
            tables.compliance_checks.len(),
        );
        tables.weather.retain(|w| w.timestamp >= cutoff);
        tables.measurements.retain(|m| m.timestamp >= cutoff);
        tables.compliance_checks.retain(|c| c.timestamp >= cutoff);
        Ok(PurgeReport {
            weather: before.0 - tables.weather.len(),
            measurements: before.1 - tables.measurements.len(),
            compliance_checks: before.2 - tables.compliance_checks.len(),
        })
    }
}
