pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod monitoring;
pub mod repo;
pub mod simulation;
pub mod telemetry;
pub mod utils;

pub use controller::{Engine, SimulationOrchestrator, StepReport};
pub use error::{EngineError, EngineResult, SinkError};
pub use monitoring::{TelemetryBuffer, TelemetryCollector};
pub use repo::{InMemoryTelemetryStore, TelemetrySink};
