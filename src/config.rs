use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub simulation: SimulationConfig,
    #[validate(nested)]
    pub turbine: TurbineNoiseConfig,
    #[validate(nested)]
    pub compliance: ComplianceConfig,
    #[validate(nested)]
    pub monitoring: MonitoringConfig,
    #[validate(nested)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Period between simulation steps
    #[validate(range(min = 1))]
    pub step_interval_ms: u64,
    /// Bounded wait for the worker on `stop()`
    #[validate(range(min = 1))]
    pub stop_timeout_ms: u64,
    /// Seed for all random sources (None = entropy)
    pub random_seed: Option<u64>,
    /// Voltage corresponding to 1.0 p.u. at the turbine terminals
    #[validate(range(exclusive_min = 0.0))]
    pub nominal_voltage_v: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub nominal_frequency_hz: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: 5_000,
            stop_timeout_ms: 2_000,
            random_seed: None,
            nominal_voltage_v: 400.0,
            nominal_frequency_hz: 50.0,
        }
    }
}

impl SimulationConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Stochastic terms of the turbine power model
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TurbineNoiseConfig {
    /// Std dev of the multiplicative wind-speed jitter
    #[validate(range(min = 0.0))]
    pub wind_jitter_std_dev: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub efficiency_mean: f64,
    #[validate(range(min = 0.0))]
    pub efficiency_std_dev: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub efficiency_min: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub efficiency_max: f64,
}

impl Default for TurbineNoiseConfig {
    fn default() -> Self {
        Self {
            wind_jitter_std_dev: 0.05,
            efficiency_mean: 0.95,
            efficiency_std_dev: 0.03,
            efficiency_min: 0.85,
            efficiency_max: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ComplianceConfig {
    #[validate(nested)]
    pub frequency: FrequencyLimits,
}

/// Frequency bands of the grid code.
///
/// Operation inside the continuous band is unrestricted; inside the wider
/// temporary band it is allowed for `temporary_duration_s`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FrequencyLimits {
    pub min_continuous_hz: f64,
    pub max_continuous_hz: f64,
    pub min_temporary_hz: f64,
    pub max_temporary_hz: f64,
    #[validate(range(min = 0.0))]
    pub temporary_duration_s: f64,
}

impl Default for FrequencyLimits {
    fn default() -> Self {
        Self {
            min_continuous_hz: 49.0,
            max_continuous_hz: 51.0,
            min_temporary_hz: 47.5,
            max_temporary_hz: 51.5,
            temporary_duration_s: 1800.0,
        }
    }
}

impl FrequencyLimits {
    /// Bands must nest: temporary ⊇ continuous, both non-empty.
    pub fn check_ordering(&self) -> EngineResult<()> {
        let ordered = self.min_temporary_hz <= self.min_continuous_hz
            && self.min_continuous_hz < self.max_continuous_hz
            && self.max_continuous_hz <= self.max_temporary_hz;
        if !ordered {
            return Err(EngineError::configuration(format!(
                "frequency bands must nest: {} <= {} < {} <= {}",
                self.min_temporary_hz,
                self.min_continuous_hz,
                self.max_continuous_hz,
                self.max_temporary_hz
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitoringConfig {
    #[validate(range(min = 1))]
    pub poll_interval_ms: u64,
    /// Capacity of every per-key ring buffer
    #[validate(range(min = 1))]
    pub max_points: usize,
    /// Capacity of the ingestion queue
    #[validate(range(min = 1))]
    pub queue_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            max_points: 500,
            queue_capacity: 2_000,
        }
    }
}

impl MonitoringConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetentionConfig {
    #[validate(range(min = 1))]
    pub days: u32,
    /// Period of the background purge
    #[validate(range(min = 1))]
    pub cleanup_interval_ms: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: 7,
            cleanup_interval_ms: 3_600_000,
        }
    }
}

impl RetentionConfig {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

impl Config {
    pub fn load() -> EngineResult<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("WINDTWIN__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> EngineResult<Self> {
        let cfg: Config = figment.extract()?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Range rules plus the cross-field rules the derive cannot express.
    pub fn check(&self) -> EngineResult<()> {
        self.validate()?;
        self.compliance.frequency.check_ordering()?;
        if self.turbine.efficiency_min > self.turbine.efficiency_max {
            return Err(EngineError::configuration(format!(
                "turbine.efficiency_min ({}) exceeds turbine.efficiency_max ({})",
                self.turbine.efficiency_min, self.turbine.efficiency_max
            )));
        }
        Ok(())
    }

    /// Defaults with a fixed seed and short periods, for tests and demos.
    pub fn deterministic(seed: u64) -> Self {
        let mut cfg = Self::default();
        cfg.simulation.random_seed = Some(seed);
        cfg
    }
}
