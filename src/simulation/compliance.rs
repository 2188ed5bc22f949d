//! # Grid-Code Compliance
//!
//! Classifies voltage and frequency disturbances against ride-through curves
//! and frequency bands. All checks are pure; the evaluator holds only
//! immutable tables and can be shared across threads freely.

use serde_json::{json, Map, Value};

use super::InterpolationTable;
use crate::config::FrequencyLimits;
use crate::domain::{ComplianceCheckType, ComplianceOutcome, GridEvent, GridEventKind};
use crate::error::EngineResult;

/// LVRT curve: voltage (p.u.) -> maximum allowed duration (s)
pub const LVRT_VOLTAGE_PU: [f64; 5] = [0.0, 0.3, 0.7, 0.85, 0.9];
pub const LVRT_DURATION_S: [f64; 5] = [0.15, 0.15, 0.7, 1.5, 3.0];

/// HVRT curve: voltage (p.u.) -> maximum allowed duration (s)
pub const HVRT_VOLTAGE_PU: [f64; 3] = [1.1, 1.15, 1.2];
pub const HVRT_DURATION_S: [f64; 3] = [60.0, 1.0, 0.1];

/// Reactive power gain in p.u. per p.u. of voltage deviation
pub const REACTIVE_POWER_GAIN: f64 = 2.0;

/// Where a frequency reading falls relative to the configured bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBand {
    Continuous,
    Temporary,
    Outside,
}

impl FrequencyBand {
    pub fn status(&self) -> &'static str {
        match self {
            FrequencyBand::Continuous => "within_continuous_limits",
            FrequencyBand::Temporary => "within_temporary_limits",
            FrequencyBand::Outside => "outside_limits",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComplianceEvaluator {
    lvrt: InterpolationTable,
    hvrt: InterpolationTable,
    frequency: FrequencyLimits,
}

impl ComplianceEvaluator {
    pub fn new(frequency: FrequencyLimits) -> EngineResult<Self> {
        frequency.check_ordering()?;
        Ok(Self {
            lvrt: InterpolationTable::new(LVRT_VOLTAGE_PU.to_vec(), LVRT_DURATION_S.to_vec())?,
            hvrt: InterpolationTable::new(HVRT_VOLTAGE_PU.to_vec(), HVRT_DURATION_S.to_vec())?,
            frequency,
        })
    }

    /// Maximum tolerated duration (s) of an undervoltage at `voltage_pu`
    pub fn lvrt_limit(&self, voltage_pu: f64) -> f64 {
        self.lvrt.evaluate(voltage_pu)
    }

    /// Maximum tolerated duration (s) of an overvoltage at `voltage_pu`
    pub fn hvrt_limit(&self, voltage_pu: f64) -> f64 {
        self.hvrt.evaluate(voltage_pu)
    }

    pub fn check_lvrt(&self, voltage_pu: f64, duration_s: f64) -> bool {
        duration_s <= self.lvrt_limit(voltage_pu)
    }

    pub fn check_hvrt(&self, voltage_pu: f64, duration_s: f64) -> bool {
        duration_s <= self.hvrt_limit(voltage_pu)
    }

    /// Required reactive power support in p.u. Not a pass/fail rule.
    pub fn required_reactive_power(&self, voltage_deviation: f64) -> f64 {
        REACTIVE_POWER_GAIN * voltage_deviation
    }

    pub fn frequency_band(&self, frequency_hz: f64) -> FrequencyBand {
        let limits = &self.frequency;
        if (limits.min_continuous_hz..=limits.max_continuous_hz).contains(&frequency_hz) {
            FrequencyBand::Continuous
        } else if (limits.min_temporary_hz..=limits.max_temporary_hz).contains(&frequency_hz) {
            FrequencyBand::Temporary
        } else {
            FrequencyBand::Outside
        }
    }

    pub fn frequency_limits(&self) -> &FrequencyLimits {
        &self.frequency
    }

    pub fn evaluate_lvrt(&self, voltage_pu: f64, duration_s: f64) -> ComplianceOutcome {
        let limit = self.lvrt_limit(voltage_pu);
        ComplianceOutcome {
            check_type: ComplianceCheckType::Lvrt,
            compliant: duration_s <= limit,
            voltage_pu: Some(voltage_pu),
            frequency_hz: None,
            duration_s: Some(duration_s),
            details: details([
                ("event_type", json!(GridEventKind::VoltageDip.to_string())),
                ("max_allowed_duration", json!(limit)),
            ]),
        }
    }

    pub fn evaluate_hvrt(&self, voltage_pu: f64, duration_s: f64) -> ComplianceOutcome {
        let limit = self.hvrt_limit(voltage_pu);
        ComplianceOutcome {
            check_type: ComplianceCheckType::Hvrt,
            compliant: duration_s <= limit,
            voltage_pu: Some(voltage_pu),
            frequency_hz: None,
            duration_s: Some(duration_s),
            details: details([
                ("event_type", json!(GridEventKind::VoltageSwell.to_string())),
                ("max_allowed_duration", json!(limit)),
            ]),
        }
    }

    /// Frequency classification.
    ///
    /// Inside either band: compliant. The temporary band adds a
    /// `max_duration` note carrying the permitted duration, which is recorded
    /// for the operator and never enforced here. Outside both: non-compliant.
    pub fn evaluate_frequency(
        &self,
        frequency_hz: f64,
        duration_s: Option<f64>,
    ) -> ComplianceOutcome {
        let band = self.frequency_band(frequency_hz);
        let mut detail = details([("status", json!(band.status()))]);
        let compliant = match band {
            FrequencyBand::Continuous => true,
            FrequencyBand::Temporary => {
                detail.insert(
                    "max_duration".to_string(),
                    json!(self.frequency.temporary_duration_s),
                );
                true
            }
            FrequencyBand::Outside => false,
        };
        ComplianceOutcome {
            check_type: ComplianceCheckType::Frequency,
            compliant,
            voltage_pu: None,
            frequency_hz: Some(frequency_hz),
            duration_s,
            details: detail,
        }
    }

    /// Reactive power support record. Always compliant; carries the value only.
    pub fn evaluate_reactive_power(&self, voltage_pu: f64) -> ComplianceOutcome {
        let deviation = voltage_pu - 1.0;
        ComplianceOutcome {
            check_type: ComplianceCheckType::ReactivePower,
            compliant: true,
            voltage_pu: Some(voltage_pu),
            frequency_hz: None,
            duration_s: None,
            details: details([
                ("voltage_deviation", json!(deviation)),
                (
                    "required_reactive_power",
                    json!(self.required_reactive_power(deviation)),
                ),
            ]),
        }
    }

    /// Dispatch a grid event to the matching rule.
    pub fn evaluate_event(&self, event: &GridEvent) -> ComplianceOutcome {
        match event.kind {
            GridEventKind::VoltageDip => self.evaluate_lvrt(event.magnitude, event.duration_s),
            GridEventKind::VoltageSwell => self.evaluate_hvrt(event.magnitude, event.duration_s),
            GridEventKind::FrequencyExcursion => {
                self.evaluate_frequency(event.magnitude, Some(event.duration_s))
            }
        }
    }
}

fn details<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn evaluator() -> ComplianceEvaluator {
        ComplianceEvaluator::new(FrequencyLimits::default()).unwrap()
    }

    #[test]
    fn test_lvrt_threshold_interpolates() {
        let eval = evaluator();
        assert!((eval.lvrt_limit(0.5) - 0.425).abs() < 1e-12);
        assert!(eval.check_lvrt(0.5, 0.4));
        assert!(!eval.check_lvrt(0.5, 0.5));
    }

    #[test]
    fn test_lvrt_clamps_outside_curve() {
        let eval = evaluator();
        assert_eq!(eval.lvrt_limit(-5.0), 0.15);
        assert_eq!(eval.lvrt_limit(0.95), 3.0);
        assert!(eval.check_lvrt(0.0, 0.15));
        assert!(!eval.check_lvrt(0.0, 0.16));
    }

    #[rstest]
    #[case(1.05, 59.0, true)]
    #[case(1.1, 60.0, true)]
    #[case(1.15, 1.0, true)]
    #[case(1.15, 1.01, false)]
    #[case(1.25, 0.1, true)]
    #[case(1.25, 0.2, false)]
    fn test_hvrt(#[case] voltage: f64, #[case] duration: f64, #[case] compliant: bool) {
        assert_eq!(evaluator().check_hvrt(voltage, duration), compliant);
    }

    #[test]
    fn test_default_dip_is_compliant() {
        let outcome = evaluator().evaluate_event(&GridEvent::voltage_dip(0.7, 0.2));
        assert_eq!(outcome.check_type, ComplianceCheckType::Lvrt);
        assert!(outcome.compliant);
        assert_eq!(outcome.detail_f64("max_allowed_duration"), Some(0.7));
        assert_eq!(outcome.detail_str("event_type"), Some("voltage_dip"));
    }

    #[test]
    fn test_swell_dispatches_to_hvrt() {
        let outcome = evaluator().evaluate_event(&GridEvent::voltage_swell(1.2, 0.5));
        assert_eq!(outcome.check_type, ComplianceCheckType::Hvrt);
        assert!(!outcome.compliant);
        assert_eq!(outcome.detail_f64("max_allowed_duration"), Some(0.1));
    }

    #[rstest]
    #[case(50.0, FrequencyBand::Continuous, true)]
    #[case(49.0, FrequencyBand::Continuous, true)]
    #[case(48.0, FrequencyBand::Temporary, true)]
    #[case(51.3, FrequencyBand::Temporary, true)]
    #[case(47.0, FrequencyBand::Outside, false)]
    #[case(52.0, FrequencyBand::Outside, false)]
    fn test_frequency_bands(
        #[case] frequency: f64,
        #[case] band: FrequencyBand,
        #[case] compliant: bool,
    ) {
        let eval = evaluator();
        assert_eq!(eval.frequency_band(frequency), band);
        let outcome = eval.evaluate_frequency(frequency, None);
        assert_eq!(outcome.compliant, compliant);
        assert_eq!(outcome.detail_str("status"), Some(band.status()));
    }

    #[test]
    fn test_temporary_band_carries_duration_note() {
        let eval = evaluator();
        let outcome = eval.evaluate_frequency(48.0, Some(60.0));
        assert!(outcome.compliant);
        assert_eq!(outcome.detail_f64("max_duration"), Some(1800.0));

        // the permitted duration is a note, not a limit
        let outcome = eval.evaluate_frequency(48.0, Some(3600.0));
        assert!(outcome.compliant);
        assert_eq!(outcome.detail_str("status"), Some("within_temporary_limits"));
        assert_eq!(outcome.detail_f64("max_duration"), Some(1800.0));
        assert_eq!(outcome.duration_s, Some(3600.0));
    }

    #[test]
    fn test_band_edges_come_from_configuration() {
        let eval = ComplianceEvaluator::new(FrequencyLimits {
            min_continuous_hz: 49.8,
            max_continuous_hz: 50.2,
            min_temporary_hz: 49.5,
            max_temporary_hz: 50.5,
            temporary_duration_s: 10.0,
        })
        .unwrap();
        assert_eq!(eval.frequency_band(49.7), FrequencyBand::Temporary);
        assert_eq!(eval.frequency_band(49.0), FrequencyBand::Outside);
    }

    #[test]
    fn test_reactive_power_is_value_only() {
        let eval = evaluator();
        assert!((eval.required_reactive_power(-0.3) + 0.6).abs() < 1e-12);

        let outcome = eval.evaluate_reactive_power(0.7);
        assert!(outcome.compliant);
        let required = outcome.detail_f64("required_reactive_power").unwrap();
        assert!((required + 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_evaluator_is_shareable_across_threads() {
        let eval = std::sync::Arc::new(evaluator());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let eval = eval.clone();
                std::thread::spawn(move || eval.check_lvrt(0.5, 0.1 * i as f64))
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![true, true, true, true]);
    }
}
