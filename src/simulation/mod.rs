//! # Wind Farm Simulation Module
//!
//! Numeric models behind the digital twin.
//!
//! ## Components
//!
//! - **InterpolationTable**: clamped piecewise-linear lookup shared by every curve
//! - **TurbineModel**: power curve, rotor speed and blade pitch per turbine rating
//! - **ComplianceEvaluator**: LVRT/HVRT curves, frequency bands, reactive power support
//! - **ScenarioSynthesizer**: scenario-conditioned weather samples and grid events
//!
//! ## Usage
//!
//! ```rust
//! use windfarm_twin::domain::TurbineStatus;
//! use windfarm_twin::simulation::{NoJitter, TurbineModel};
//!
//! let model = TurbineModel::new(3.05e6).unwrap();
//!
//! let power_w = model.power_output(8.0, TurbineStatus::Operational, &mut NoJitter);
//! let rpm = model.rotor_speed(8.0, TurbineStatus::Operational);
//!
//! assert!((power_w - 1_006_500.0).abs() < 1e-6);
//! assert_eq!(rpm, 11.0);
//! ```

pub mod compliance;
pub mod interpolation;
pub mod scenario;
pub mod turbine;

pub use compliance::{ComplianceEvaluator, FrequencyBand};
pub use interpolation::InterpolationTable;
pub use scenario::ScenarioSynthesizer;
pub use turbine::{GaussianJitter, JitterSource, NoJitter, TurbineModel};
