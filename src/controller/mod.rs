pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{OrchestratorBuilder, SimulationOrchestrator, StepReport};
pub use scheduler::{PeriodicTask, TaskStatus};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::ScenarioId;
use crate::error::EngineResult;
use crate::monitoring::{TelemetryBuffer, TelemetryCollector};
use crate::repo::{PurgeReport, TelemetrySink};

/// Simulation worker, telemetry poll loop and retention purge sharing a sink.
///
/// Inert until [`Engine::start`]; each instance is independent, so tests can
/// run several side by side.
pub struct Engine {
    cfg: Config,
    orchestrator: SimulationOrchestrator,
    collector: TelemetryCollector,
    retention: tokio::sync::Mutex<Option<PeriodicTask>>,
}

impl Engine {
    pub fn new(cfg: Config, sink: Arc<dyn TelemetrySink>) -> EngineResult<Self> {
        let orchestrator = SimulationOrchestrator::new(cfg.clone(), sink.clone())?;
        Ok(Self::with_orchestrator(cfg, sink, orchestrator))
    }

    /// Wire a pre-built orchestrator (custom jitter, clock or synthesizer).
    pub fn with_orchestrator(
        cfg: Config,
        sink: Arc<dyn TelemetrySink>,
        orchestrator: SimulationOrchestrator,
    ) -> Self {
        let buffer = Arc::new(TelemetryBuffer::from_config(&cfg.monitoring));
        let collector = TelemetryCollector::new(
            &cfg.monitoring,
            cfg.simulation.stop_timeout(),
            sink,
            buffer,
        );
        Self {
            cfg,
            orchestrator,
            collector,
            retention: tokio::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn orchestrator(&self) -> &SimulationOrchestrator {
        &self.orchestrator
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn buffer(&self) -> Arc<TelemetryBuffer> {
        self.collector.buffer()
    }

    /// Start the simulation, data collection and the retention purge.
    pub async fn start(&self) -> EngineResult<()> {
        self.orchestrator.start().await?;
        self.collector.start_data_collection().await;
        {
            let mut retention = self.retention.lock().await;
            if retention.is_none() {
                let cfg = &self.cfg.retention;
                *retention = Some(
                    self.orchestrator
                        .spawn_retention(cfg.days, cfg.cleanup_interval()),
                );
            }
        }
        info!("engine started");
        Ok(())
    }

    /// Stop every worker. Returns `true` when all exited within their timeout.
    pub async fn stop(&self) -> bool {
        let (simulation, collection, retention) = tokio::join!(
            self.orchestrator.stop(),
            self.collector.stop_data_collection(),
            self.stop_retention()
        );
        let clean = simulation && collection && retention;
        if clean {
            info!("engine stopped");
        } else {
            warn!(
                simulation,
                collection,
                retention,
                "engine stopped with workers still draining"
            );
        }
        clean
    }

    async fn stop_retention(&self) -> bool {
        let task = self.retention.lock().await.take();
        match task {
            Some(task) => task.stop(self.cfg.simulation.stop_timeout()).await,
            None => true,
        }
    }

    /// Status of the retention purge while it runs
    pub async fn retention_status(&self) -> Option<TaskStatus> {
        self.retention.lock().await.as_ref().map(PeriodicTask::status)
    }

    pub async fn is_running(&self) -> bool {
        self.orchestrator.is_running().await
    }

    pub async fn run_step(&self) -> StepReport {
        self.orchestrator.run_step().await
    }

    pub async fn activate_scenario(&self, id: ScenarioId) -> EngineResult<()> {
        self.orchestrator.activate_scenario(id).await
    }

    /// Purge telemetry older than the configured retention.
    pub async fn cleanup_old_data(&self) -> EngineResult<PurgeReport> {
        self.orchestrator
            .cleanup_old_data(self.cfg.retention.days)
            .await
    }
}
