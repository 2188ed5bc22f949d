//! Clamped piecewise-linear lookup tables.

use crate::error::{EngineError, EngineResult};

/// Immutable piecewise-linear table over a strictly increasing x-axis.
///
/// Inputs outside `[x_first, x_last]` return the boundary output; the table
/// never extrapolates.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl InterpolationTable {
    /// Build a table, rejecting malformed breakpoints immediately.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> EngineResult<Self> {
        if xs.len() != ys.len() {
            return Err(EngineError::configuration(format!(
                "interpolation table has {} breakpoints but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(EngineError::configuration(
                "interpolation table needs at least two breakpoints",
            ));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(EngineError::configuration(
                "interpolation table contains non-finite values",
            ));
        }
        if let Some(pair) = xs.windows(2).find(|w| w[1] <= w[0]) {
            return Err(EngineError::configuration(format!(
                "interpolation breakpoints must increase strictly ({} followed by {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { xs, ys })
    }

    /// Build a table whose outputs are `fractions` scaled by `scale`.
    pub fn scaled(xs: Vec<f64>, fractions: &[f64], scale: f64) -> EngineResult<Self> {
        Self::new(xs, fractions.iter().map(|f| f * scale).collect())
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let last = self.xs.len() - 1;
        if x.is_nan() || x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[last] {
            return self.ys[last];
        }

        // First breakpoint strictly greater than x; x sits in [xs[i-1], xs[i]).
        let i = self.xs.partition_point(|&bp| bp <= x);
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let (y0, y1) = (self.ys[i - 1], self.ys[i]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lvrt() -> InterpolationTable {
        InterpolationTable::new(
            vec![0.0, 0.3, 0.7, 0.85, 0.9],
            vec![0.15, 0.15, 0.7, 1.5, 3.0],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_breakpoints() {
        let table = lvrt();
        assert_eq!(table.evaluate(0.3), 0.15);
        assert_eq!(table.evaluate(0.7), 0.7);
        assert_eq!(table.evaluate(0.85), 1.5);
        assert_eq!(table.evaluate(0.9), 3.0);
    }

    #[test]
    fn test_linear_between_breakpoints() {
        let table = lvrt();
        assert!((table.evaluate(0.5) - 0.425).abs() < 1e-12);
        assert!((table.evaluate(0.875) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_clamps_outside_domain() {
        let table = lvrt();
        assert_eq!(table.evaluate(-5.0), 0.15);
        assert_eq!(table.evaluate(1.2), 3.0);
        assert_eq!(table.evaluate(f64::NEG_INFINITY), 0.15);
        assert_eq!(table.evaluate(f64::INFINITY), 3.0);
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let err = InterpolationTable::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_rejects_non_monotonic_breakpoints() {
        assert!(InterpolationTable::new(vec![0.0, 2.0, 1.0], vec![0.0, 1.0, 2.0]).is_err());
        assert!(InterpolationTable::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0, 2.0]).is_err());
    }

    #[test]
    fn test_rejects_short_tables() {
        assert!(InterpolationTable::new(vec![1.0], vec![1.0]).is_err());
        assert!(InterpolationTable::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_decreasing_outputs_are_allowed() {
        let hvrt = InterpolationTable::new(vec![1.1, 1.15, 1.2], vec![60.0, 1.0, 0.1]).unwrap();
        assert_eq!(hvrt.evaluate(1.0), 60.0);
        assert!((hvrt.evaluate(1.175) - 0.55).abs() < 1e-9);
        assert_eq!(hvrt.evaluate(1.3), 0.1);
    }

    proptest! {
        #[test]
        fn prop_below_domain_returns_first_value(x in -1.0e6f64..0.0) {
            prop_assert_eq!(lvrt().evaluate(x), 0.15);
        }

        #[test]
        fn prop_above_domain_returns_last_value(x in 0.9f64..1.0e6) {
            prop_assert_eq!(lvrt().evaluate(x), 3.0);
        }

        #[test]
        fn prop_output_stays_within_value_range(x in -10.0f64..10.0) {
            let y = lvrt().evaluate(x);
            prop_assert!((0.15..=3.0).contains(&y));
        }
    }
}
