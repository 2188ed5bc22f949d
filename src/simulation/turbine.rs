//! # Turbine Model
//!
//! Maps wind speed and operating status to electrical power, rotor speed and
//! blade pitch for a single turbine. Rotor speed and pitch are deterministic;
//! power carries bounded stochastic jitter drawn from an injectable
//! [`JitterSource`].

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use super::InterpolationTable;
use crate::config::TurbineNoiseConfig;
use crate::domain::{Turbine, TurbineStatus};
use crate::error::{EngineError, EngineResult};

/// Power-curve breakpoints in m/s
pub const POWER_CURVE_WIND_SPEEDS: [f64; 17] = [
    0.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 25.0,
];

/// Power-curve output as a fraction of nominal power
pub const POWER_CURVE_FRACTIONS: [f64; 17] = [
    0.0, 0.0, 0.03, 0.08, 0.15, 0.23, 0.33, 0.44, 0.56, 0.67, 0.77, 0.87, 0.93, 0.97, 0.98, 1.0,
    1.0,
];

/// Cut-in wind speed (m/s)
pub const CUT_IN_WIND_SPEED: f64 = 3.0;
/// Rated wind speed (m/s); rotor speed saturates and pitch control starts here
pub const RATED_WIND_SPEED: f64 = 12.0;
pub const MIN_ROTOR_SPEED_RPM: f64 = 5.0;
pub const MAX_ROTOR_SPEED_RPM: f64 = 15.0;
pub const ROTOR_SPEED_SLOPE: f64 = 1.2;
pub const PITCH_SLOPE_DEG: f64 = 5.0;
pub const MAX_PITCH_DEG: f64 = 45.0;

/// Source of the two random terms in the power computation.
pub trait JitterSource: Send {
    /// Relative wind-speed deviation, applied as `wind * (1 + noise)`
    fn wind_noise(&mut self) -> f64;
    /// Raw conversion efficiency before clamping
    fn efficiency(&mut self) -> f64;
}

/// Gaussian jitter backed by a seedable RNG
pub struct GaussianJitter {
    rng: StdRng,
    wind: Normal<f64>,
    efficiency: Normal<f64>,
}

impl GaussianJitter {
    pub fn new(config: &TurbineNoiseConfig, seed: Option<u64>) -> EngineResult<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let wind = Normal::new(0.0, config.wind_jitter_std_dev)
            .map_err(|e| EngineError::configuration(format!("wind jitter: {e}")))?;
        let efficiency = Normal::new(config.efficiency_mean, config.efficiency_std_dev)
            .map_err(|e| EngineError::configuration(format!("efficiency jitter: {e}")))?;
        Ok(Self {
            rng,
            wind,
            efficiency,
        })
    }
}

impl JitterSource for GaussianJitter {
    fn wind_noise(&mut self) -> f64 {
        self.wind.sample(&mut self.rng)
    }

    fn efficiency(&mut self) -> f64 {
        self.efficiency.sample(&mut self.rng)
    }
}

/// No wind deviation and ideal efficiency. Makes power output reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn wind_noise(&mut self) -> f64 {
        0.0
    }

    fn efficiency(&mut self) -> f64 {
        1.0
    }
}

/// Power/mechanical model of one turbine
#[derive(Debug, Clone)]
pub struct TurbineModel {
    nominal_power_w: f64,
    power_curve: InterpolationTable,
    efficiency_min: f64,
    efficiency_max: f64,
}

impl TurbineModel {
    /// Build the model for a turbine rating with the default efficiency clamp.
    pub fn new(nominal_power_w: f64) -> EngineResult<Self> {
        Self::with_noise_config(nominal_power_w, &TurbineNoiseConfig::default())
    }

    pub fn with_noise_config(
        nominal_power_w: f64,
        noise: &TurbineNoiseConfig,
    ) -> EngineResult<Self> {
        if !nominal_power_w.is_finite() || nominal_power_w < 0.0 {
            return Err(EngineError::configuration(format!(
                "nominal power must be a non-negative number of watts, got {nominal_power_w}"
            )));
        }
        let power_curve = InterpolationTable::scaled(
            POWER_CURVE_WIND_SPEEDS.to_vec(),
            &POWER_CURVE_FRACTIONS,
            nominal_power_w,
        )?;
        Ok(Self {
            nominal_power_w,
            power_curve,
            efficiency_min: noise.efficiency_min,
            efficiency_max: noise.efficiency_max,
        })
    }

    pub fn for_turbine(turbine: &Turbine, noise: &TurbineNoiseConfig) -> EngineResult<Self> {
        Self::with_noise_config(turbine.nominal_power_w, noise)
    }

    pub fn nominal_power_w(&self) -> f64 {
        self.nominal_power_w
    }

    /// Power from the curve without any jitter, in W.
    pub fn curve_power(&self, wind_speed: f64) -> f64 {
        self.power_curve.evaluate(wind_speed.max(0.0))
    }

    /// Electrical power output in W.
    ///
    /// Zero unless the turbine is operational. Otherwise the wind speed is
    /// jittered, looked up on the power curve and scaled by a clamped
    /// efficiency factor.
    pub fn power_output(
        &self,
        wind_speed: f64,
        status: TurbineStatus,
        jitter: &mut dyn JitterSource,
    ) -> f64 {
        if !status.is_operational() {
            return 0.0;
        }
        let wind_speed = wind_speed.max(0.0);
        let adjusted = (wind_speed * (1.0 + jitter.wind_noise())).max(0.0);
        let efficiency = jitter
            .efficiency()
            .clamp(self.efficiency_min, self.efficiency_max);
        (self.power_curve.evaluate(adjusted) * efficiency).max(0.0)
    }

    /// Rotor speed in rpm
    pub fn rotor_speed(&self, wind_speed: f64, status: TurbineStatus) -> f64 {
        rotor_speed(wind_speed, status)
    }

    /// Blade pitch in degrees
    pub fn blade_pitch(&self, wind_speed: f64, status: TurbineStatus) -> f64 {
        blade_pitch(wind_speed, status)
    }
}

pub fn rotor_speed(wind_speed: f64, status: TurbineStatus) -> f64 {
    let wind_speed = wind_speed.max(0.0);
    if !status.is_operational() || wind_speed < CUT_IN_WIND_SPEED {
        0.0
    } else if wind_speed < RATED_WIND_SPEED {
        MIN_ROTOR_SPEED_RPM + (wind_speed - CUT_IN_WIND_SPEED) * ROTOR_SPEED_SLOPE
    } else {
        MAX_ROTOR_SPEED_RPM
    }
}

pub fn blade_pitch(wind_speed: f64, status: TurbineStatus) -> f64 {
    let wind_speed = wind_speed.max(0.0);
    if !status.is_operational() || wind_speed < RATED_WIND_SPEED {
        0.0
    } else {
        ((wind_speed - RATED_WIND_SPEED) * PITCH_SLOPE_DEG).min(MAX_PITCH_DEG)
    }
}
