//! # Simulation Orchestrator
//!
//! Owns the per-turbine models and the simulation worker. One step resolves
//! the active scenario, synthesizes weather and any grid events, and writes
//! one measurement (plus one compliance check per grid event) per tracked
//! turbine through the [`TelemetrySink`].
//!
//! Lifecycle is `Idle -> Running -> Idle`. `start()` on a running
//! orchestrator is a no-op; `stop()` waits a bounded time for the worker.
//! Steps never overlap: a worker left draining by a timed-out `stop()`, its
//! successor and manual `run_step()` calls all queue on one step lock.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::scheduler::{PeriodicTask, TaskStatus};
use crate::config::Config;
use crate::domain::{
    ComplianceCheck, ComplianceOutcome, GridEvent, ScenarioId, Turbine, TurbineId,
    TurbineMeasurement, TurbineStatus, WeatherSample,
};
use crate::error::{EngineError, EngineResult, SinkError};
use crate::repo::{PurgeReport, TelemetrySink};
use crate::simulation::{
    ComplianceEvaluator, GaussianJitter, JitterSource, ScenarioSynthesizer, TurbineModel,
};
use crate::utils::{Clock, SystemClock};

/// Summary of one simulation step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepReport {
    pub timestamp: Option<DateTime<Utc>>,
    pub scenario: Option<ScenarioId>,
    pub weather_saved: bool,
    /// Voltage event first, then any frequency excursion
    pub grid_events: Vec<GridEvent>,
    pub measurements: usize,
    pub compliance_checks: usize,
    pub turbine_failures: usize,
    /// Set when the step was abandoned before processing turbines
    pub error: Option<String>,
}

impl StepReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.turbine_failures == 0
    }
}

#[derive(Debug, Clone)]
struct TrackedTurbine {
    turbine: Turbine,
    model: TurbineModel,
}

/// Turbine outputs for one step, before they are written
struct TurbineReading {
    measurement: TurbineMeasurement,
    compliance: Vec<ComplianceCheck>,
}

/// State shared between the control path and the worker
struct StepCore {
    config: Config,
    sink: Arc<dyn TelemetrySink>,
    evaluator: ComplianceEvaluator,
    synthesizer: Mutex<ScenarioSynthesizer>,
    jitter: Mutex<Box<dyn JitterSource>>,
    clock: Arc<dyn Clock>,
    turbines: RwLock<BTreeMap<TurbineId, TrackedTurbine>>,
    step_lock: tokio::sync::Mutex<()>,
}

impl StepCore {
    async fn initialize_turbines(&self) -> EngineResult<usize> {
        let turbines = self.sink.list_turbines().await?;
        let mut tracked = BTreeMap::new();
        for turbine in turbines {
            let model = TurbineModel::for_turbine(&turbine, &self.config.turbine)?;
            tracked.insert(turbine.id, TrackedTurbine { turbine, model });
        }
        let count = tracked.len();
        *self.turbines.write() = tracked;
        Ok(count)
    }

    async fn run_step(&self) -> StepReport {
        let _step = self.step_lock.lock().await;
        let mut report = StepReport::default();

        let scenario = match self.sink.get_active_scenario().await {
            Ok(scenario) => scenario,
            Err(e) => {
                error!(error = %e, "failed to resolve active scenario, skipping step");
                report.error = Some(e.to_string());
                return report;
            }
        };
        report.scenario = scenario.as_ref().map(|s| s.id);

        let now = self.clock.now();
        report.timestamp = Some(now);

        let (weather, grid_events, failed_turbine) = {
            let mut synth = self.synthesizer.lock();
            let weather = synth.synthesize_weather(scenario.as_ref(), now);
            let events = synth.synthesize_grid_events(scenario.as_ref());
            let failed = synth.failed_turbine(scenario.as_ref());
            (weather, events, failed)
        };

        if let Err(e) = self.sink.save_weather(&weather).await {
            error!(error = %e, "failed to save weather sample, skipping step");
            report.error = Some(e.to_string());
            return report;
        }
        report.weather_saved = true;

        let outcomes: Vec<ComplianceOutcome> = grid_events
            .iter()
            .map(|event| self.evaluator.evaluate_event(event))
            .collect();
        let statuses = self.current_statuses().await;
        let tracked: Vec<TrackedTurbine> = self.turbines.read().values().cloned().collect();

        for entry in tracked {
            let id = entry.turbine.id;
            let status = if failed_turbine == Some(id) {
                TurbineStatus::Fault
            } else {
                match statuses.as_ref() {
                    Some(current) => match current.get(&id) {
                        Some(status) => *status,
                        None => {
                            warn!(turbine_id = %id, "turbine no longer known to the sink");
                            report.turbine_failures += 1;
                            continue;
                        }
                    },
                    None => entry.turbine.status,
                }
            };

            let reading = self.compute_reading(&entry, status, &weather, &grid_events, &outcomes);
            match self.write_reading(&reading).await {
                Ok(()) => {
                    report.measurements += 1;
                    report.compliance_checks += reading.compliance.len();
                }
                Err(e) => {
                    warn!(turbine_id = %id, error = %e, "failed to process turbine");
                    report.turbine_failures += 1;
                }
            }
        }

        debug!(
            scenario = ?report.scenario,
            wind_speed_ms = weather.wind_speed_ms,
            measurements = report.measurements,
            compliance_checks = report.compliance_checks,
            turbine_failures = report.turbine_failures,
            "simulation step"
        );
        report.grid_events = grid_events;
        report
    }

    /// Fresh turbine statuses. `None` falls back to the start-time snapshot.
    async fn current_statuses(&self) -> Option<HashMap<TurbineId, TurbineStatus>> {
        match self.sink.list_turbines().await {
            Ok(turbines) => Some(turbines.into_iter().map(|t| (t.id, t.status)).collect()),
            Err(e) => {
                warn!(error = %e, "failed to refresh turbine statuses, using snapshot");
                None
            }
        }
    }

    fn compute_reading(
        &self,
        entry: &TrackedTurbine,
        status: TurbineStatus,
        weather: &WeatherSample,
        grid_events: &[GridEvent],
        outcomes: &[ComplianceOutcome],
    ) -> TurbineReading {
        let wind = weather.wind_speed_ms;
        let power_output_w = {
            let mut jitter = self.jitter.lock();
            entry.model.power_output(wind, status, jitter.as_mut())
        };

        let sim = &self.config.simulation;
        let voltage_pu = grid_events
            .iter()
            .find_map(GridEvent::voltage_pu)
            .unwrap_or(1.0);
        let frequency_hz = grid_events
            .iter()
            .find_map(GridEvent::frequency_hz)
            .unwrap_or(sim.nominal_frequency_hz);

        let measurement = TurbineMeasurement {
            turbine_id: entry.turbine.id,
            timestamp: weather.timestamp,
            power_output_w,
            wind_speed_ms: wind,
            rotor_speed_rpm: entry.model.rotor_speed(wind, status),
            blade_pitch_deg: entry.model.blade_pitch(wind, status),
            nacelle_orientation_deg: weather.wind_direction_deg,
            grid_voltage_v: voltage_pu * sim.nominal_voltage_v,
            grid_frequency_hz: frequency_hz,
        };
        let compliance = outcomes
            .iter()
            .map(|o| ComplianceCheck::from_outcome(entry.turbine.id, weather.timestamp, o.clone()))
            .collect();

        TurbineReading {
            measurement,
            compliance,
        }
    }

    async fn purge_older_than(&self, days: u32) -> EngineResult<PurgeReport> {
        let cutoff = self.clock.now() - ChronoDuration::days(i64::from(days));
        let report = self.sink.purge_before(cutoff).await.map_err(|e| {
            warn!(days, error = %e, "retention purge failed");
            e
        })?;
        info!(
            days,
            weather = report.weather,
            measurements = report.measurements,
            compliance_checks = report.compliance_checks,
            "old telemetry purged"
        );
        Ok(report)
    }

    async fn write_reading(&self, reading: &TurbineReading) -> Result<(), SinkError> {
        self.sink.save_measurement(&reading.measurement).await?;
        for check in &reading.compliance {
            self.sink.save_compliance_check(check).await?;
        }
        Ok(())
    }
}

/// Builder for [`SimulationOrchestrator`] with injectable randomness and clock.
pub struct OrchestratorBuilder {
    config: Config,
    sink: Arc<dyn TelemetrySink>,
    jitter: Option<Box<dyn JitterSource>>,
    synthesizer: Option<ScenarioSynthesizer>,
    clock: Option<Arc<dyn Clock>>,
}

impl OrchestratorBuilder {
    pub fn jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.jitter = Some(jitter);
        self
    }

    pub fn synthesizer(mut self, synthesizer: ScenarioSynthesizer) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and build every table up front.
    pub fn build(self) -> EngineResult<SimulationOrchestrator> {
        self.config.check()?;
        let seed = self.config.simulation.random_seed;

        let jitter = match self.jitter {
            Some(jitter) => jitter,
            None => Box::new(GaussianJitter::new(&self.config.turbine, seed)?),
        };
        let synthesizer = self
            .synthesizer
            .unwrap_or_else(|| ScenarioSynthesizer::new(seed.map(|s| s.wrapping_add(1))));
        let evaluator = ComplianceEvaluator::new(self.config.compliance.frequency.clone())?;

        let step_interval = self.config.simulation.step_interval();
        let stop_timeout = self.config.simulation.stop_timeout();

        let core = StepCore {
            config: self.config,
            sink: self.sink,
            evaluator,
            synthesizer: Mutex::new(synthesizer),
            jitter: Mutex::new(jitter),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            turbines: RwLock::new(BTreeMap::new()),
            step_lock: tokio::sync::Mutex::new(()),
        };

        Ok(SimulationOrchestrator {
            core: Arc::new(core),
            worker: tokio::sync::Mutex::new(None),
            last_status: RwLock::new(None),
            step_interval,
            stop_timeout,
        })
    }
}

pub struct SimulationOrchestrator {
    core: Arc<StepCore>,
    worker: tokio::sync::Mutex<Option<PeriodicTask>>,
    last_status: RwLock<Option<Arc<RwLock<TaskStatus>>>>,
    step_interval: Duration,
    stop_timeout: Duration,
}

impl SimulationOrchestrator {
    pub fn new(config: Config, sink: Arc<dyn TelemetrySink>) -> EngineResult<Self> {
        Self::builder(config, sink).build()
    }

    pub fn builder(config: Config, sink: Arc<dyn TelemetrySink>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            sink,
            jitter: None,
            synthesizer: None,
            clock: None,
        }
    }

    /// Snapshot every turbine known to the sink and build its model.
    ///
    /// Returns the number of tracked turbines.
    pub async fn initialize_turbines(&self) -> EngineResult<usize> {
        self.core.initialize_turbines().await
    }

    pub fn tracked_turbines(&self) -> Vec<TurbineId> {
        self.core.turbines.read().keys().copied().collect()
    }

    /// Start the periodic worker. No-op when already running.
    pub async fn start(&self) -> EngineResult<()> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            debug!("simulation already running");
            return Ok(());
        }

        let count = self.core.initialize_turbines().await?;

        let core = self.core.clone();
        let task = PeriodicTask::spawn("simulation", self.step_interval, move || {
            let core = core.clone();
            async move {
                let report = core.run_step().await;
                let failures = report.turbine_failures;
                match report.error {
                    Some(e) => Err(e),
                    None if failures > 0 => Err(format!("{failures} turbine(s) failed")),
                    None => Ok(()),
                }
            }
        });
        *self.last_status.write() = Some(task.status_handle());
        *worker = Some(task);

        info!(
            turbines = count,
            step_interval_ms = self.step_interval.as_millis() as u64,
            "simulation started"
        );
        Ok(())
    }

    /// Signal the worker and wait for it, bounded by the configured stop timeout.
    ///
    /// Returns `true` when the worker exited within the timeout. Either way the
    /// orchestrator is idle afterwards and can be started again.
    pub async fn stop(&self) -> bool {
        let task = self.worker.lock().await.take();
        match task {
            Some(task) => {
                let exited = task.stop(self.stop_timeout).await;
                info!(worker_exited = exited, "simulation stopped");
                exited
            }
            None => true,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Status of the current (or most recent) worker
    pub fn worker_status(&self) -> Option<TaskStatus> {
        self.last_status.read().as_ref().map(|s| s.read().clone())
    }

    /// Execute one simulation cycle. Failures are logged and summarised, never returned.
    pub async fn run_step(&self) -> StepReport {
        self.core.run_step().await
    }

    /// Make `id` the only active scenario.
    pub async fn activate_scenario(&self, id: ScenarioId) -> EngineResult<()> {
        if !self.core.sink.activate_scenario(id).await? {
            return Err(EngineError::NotFound(format!("scenario {id}")));
        }
        info!(scenario_id = %id, "scenario activated");
        Ok(())
    }

    /// Delete weather, measurements and compliance checks older than `days`.
    pub async fn cleanup_old_data(&self, days: u32) -> EngineResult<PurgeReport> {
        self.core.purge_older_than(days).await
    }

    /// Periodic [`Self::cleanup_old_data`], first run immediately.
    pub fn spawn_retention(&self, days: u32, every: Duration) -> PeriodicTask {
        let core = self.core.clone();
        PeriodicTask::spawn("retention", every, move || {
            let core = core.clone();
            async move { core.purge_older_than(days).await.map(|_| ()) }
        })
    }
}
