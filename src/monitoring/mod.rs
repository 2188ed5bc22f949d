//! Live telemetry for dashboards: a poll loop reading the sink and a bounded
//! buffer of plot-ready series.

pub mod buffer;
pub mod collector;

pub use buffer::{DataPoint, LabelledSeries, TelemetryBuffer};
pub use collector::TelemetryCollector;
