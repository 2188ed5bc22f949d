//! # Scenario Synthesis
//!
//! Produces one weather sample per simulation step plus, for grid faults, a
//! voltage event and an optional frequency excursion, conditioned on the
//! active scenario. Explicit scenario parameters take
//! precedence over the type-based baselines.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::domain::{GridEvent, Scenario, ScenarioType, TurbineId, WeatherSample};

pub const BASE_WIND_SPEED_MS: f64 = 8.0;
pub const BASE_TEMPERATURE_C: f64 = 15.0;
pub const BASE_PRESSURE_HPA: f64 = 1013.0;
pub const BASE_HUMIDITY_PERCENT: f64 = 70.0;

pub const DEFAULT_DIP_VOLTAGE_PU: f64 = 0.7;
pub const DEFAULT_DIP_DURATION_S: f64 = 0.2;

/// Parameter keys understood by the synthesizer
pub mod keys {
    pub const WIND_SPEED: &str = "wind_speed";
    pub const TEMPERATURE: &str = "temperature";
    pub const VOLTAGE: &str = "voltage";
    pub const DURATION: &str = "duration";
    pub const FREQUENCY: &str = "frequency";
    pub const TURBINE_ID: &str = "turbine_id";
}

/// Standard deviation of the per-sample jitter on each quantity
#[derive(Debug, Clone, Copy)]
struct SampleJitter {
    wind_speed: f64,
    temperature: f64,
    pressure: f64,
    humidity: f64,
}

const SAMPLE_JITTER: SampleJitter = SampleJitter {
    wind_speed: 0.8,
    temperature: 1.0,
    pressure: 2.0,
    humidity: 3.0,
};

/// Type-based baseline before parameter overrides and jitter
#[derive(Debug, Clone, Copy, PartialEq)]
struct Baseline {
    wind_speed: f64,
    temperature: f64,
    pressure: f64,
    humidity: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            wind_speed: BASE_WIND_SPEED_MS,
            temperature: BASE_TEMPERATURE_C,
            pressure: BASE_PRESSURE_HPA,
            humidity: BASE_HUMIDITY_PERCENT,
        }
    }
}

pub struct ScenarioSynthesizer {
    rng: StdRng,
}

impl ScenarioSynthesizer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // std_dev values are compile-time constants, all finite and positive
        match Normal::new(mean, std_dev) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    fn baseline(&mut self, scenario: Option<&Scenario>) -> Baseline {
        let mut base = Baseline::default();
        let Some(scenario) = scenario else {
            return base;
        };

        match scenario.scenario_type {
            ScenarioType::Storm => {
                base.wind_speed = self.gaussian(20.0, 2.0);
                base.pressure = self.gaussian(990.0, 5.0);
                base.humidity = self.gaussian(85.0, 5.0);
            }
            ScenarioType::NormalOperation => {
                base.wind_speed = self.gaussian(BASE_WIND_SPEED_MS, 1.5);
            }
            ScenarioType::GridFault | ScenarioType::TurbineFailure | ScenarioType::Custom => {}
        }

        if let Some(wind) = scenario.parameters.get_f64(keys::WIND_SPEED) {
            base.wind_speed = wind;
        }
        if let Some(temperature) = scenario.parameters.get_f64(keys::TEMPERATURE) {
            base.temperature = temperature;
        }
        base
    }

    /// Weather for one step. `None` means no active scenario: plain baseline.
    pub fn synthesize_weather(
        &mut self,
        scenario: Option<&Scenario>,
        timestamp: DateTime<Utc>,
    ) -> WeatherSample {
        let base = self.baseline(scenario);

        let wind_speed_ms = self
            .gaussian(base.wind_speed, SAMPLE_JITTER.wind_speed)
            .max(0.0);
        let wind_direction_deg = self.rng.gen_range(0.0..360.0);
        let temperature_c = self.gaussian(base.temperature, SAMPLE_JITTER.temperature);
        let pressure_hpa = self.gaussian(base.pressure, SAMPLE_JITTER.pressure);
        let humidity_percent = self
            .gaussian(base.humidity, SAMPLE_JITTER.humidity)
            .clamp(0.0, 100.0);

        WeatherSample {
            timestamp,
            wind_speed_ms,
            wind_direction_deg,
            temperature_c,
            pressure_hpa,
            humidity_percent,
        }
    }

    /// Voltage event for one step. Only `grid_fault` scenarios produce one.
    ///
    /// The `voltage` parameter (default 0.7 p.u.) yields a dip below 1.0 p.u.
    /// and a swell above it.
    pub fn synthesize_grid_event(&self, scenario: Option<&Scenario>) -> Option<GridEvent> {
        let scenario = grid_fault(scenario)?;
        let params = &scenario.parameters;
        let duration = fault_duration(scenario);
        let voltage = params
            .get_f64(keys::VOLTAGE)
            .unwrap_or(DEFAULT_DIP_VOLTAGE_PU);
        if voltage > 1.0 {
            Some(GridEvent::voltage_swell(voltage, duration))
        } else {
            Some(GridEvent::voltage_dip(voltage, duration))
        }
    }

    /// Frequency excursion accompanying a `grid_fault` that names a `frequency`.
    pub fn synthesize_frequency_event(&self, scenario: Option<&Scenario>) -> Option<GridEvent> {
        let scenario = grid_fault(scenario)?;
        let frequency = scenario.parameters.get_f64(keys::FREQUENCY)?;
        Some(GridEvent::frequency_excursion(
            frequency,
            fault_duration(scenario),
        ))
    }

    /// Every grid event for one step: the voltage event first, then any
    /// frequency excursion.
    pub fn synthesize_grid_events(&self, scenario: Option<&Scenario>) -> Vec<GridEvent> {
        self.synthesize_grid_event(scenario)
            .into_iter()
            .chain(self.synthesize_frequency_event(scenario))
            .collect()
    }

    /// Turbine forced into fault by a `turbine_failure` scenario, if any
    pub fn failed_turbine(&self, scenario: Option<&Scenario>) -> Option<TurbineId> {
        let scenario = scenario?;
        if scenario.scenario_type != ScenarioType::TurbineFailure {
            return None;
        }
        scenario.parameters.get_u32(keys::TURBINE_ID).map(TurbineId)
    }
}

fn grid_fault(scenario: Option<&Scenario>) -> Option<&Scenario> {
    scenario.filter(|s| s.scenario_type == ScenarioType::GridFault)
}

fn fault_duration(scenario: &Scenario) -> f64 {
    scenario
        .parameters
        .get_f64(keys::DURATION)
        .unwrap_or(DEFAULT_DIP_DURATION_S)
}
