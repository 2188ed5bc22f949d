use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use windfarm_twin::{config, controller, repo, telemetry};

use config::Config;
use telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    init_tracing();

    let cfg = Config::load()?;

    let store = Arc::new(repo::InMemoryTelemetryStore::seeded());
    let engine = controller::Engine::new(cfg.clone(), store)?;

    info!(
        step_interval_ms = cfg.simulation.step_interval_ms,
        poll_interval_ms = cfg.monitoring.poll_interval_ms,
        seeded = cfg.simulation.random_seed.is_some(),
        "starting wind farm digital twin"
    );
    engine.start().await?;

    telemetry::shutdown_signal().await;

    engine.stop().await;
    warn!("shutdown complete");
    Ok(())
}
