//! Two-model extrapolation of a series observed at two time points.
//!
//! - **Linear**: repeat the last observed increment once:
//!   `linear = v1 + (v1 - v0)`.
//!   The horizon `t2 - t1` is ignored on purpose. Published projections
//!   were computed with this rule, so it must not be turned into a
//!   time-scaled slope.
//! - **Exponential**: constant continuous growth rate
//!   `rate = ln(v1 / v0) / (t1 - t0)`, applied from `t0`:
//!   `exponential = v0 * exp(rate * (t2 - t0))`.
//!   Unlike the linear rule, this one scales with elapsed time.
//!
//! Undefined results are `NaN`, never a panic or an error.

/// Forecasts for one series at one target time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub linear: f64,
    pub exponential: f64,
    /// Continuous growth rate per unit of time used by the exponential model.
    pub rate: f64,
}

impl Projection {
    const UNDEFINED: Projection = Projection {
        linear: f64::NAN,
        exponential: f64::NAN,
        rate: f64::NAN,
    };
}

/// Project `(t0, v0), (t1, v1)` to `t2`.
///
/// - non-finite `v0` or `v1` (missing data): every field is `NaN`
/// - `v0 <= 0` or `v1 <= 0`: `exponential` and `rate` are `NaN`, `linear` is still computed
pub fn project(v0: f64, v1: f64, t0: f64, t1: f64, t2: f64) -> Projection {
    if !(v0.is_finite() && v1.is_finite()) {
        return Projection::UNDEFINED;
    }

    let linear = v1 + (v1 - v0);

    if v0 <= 0.0 || v1 <= 0.0 {
        return Projection {
            linear,
            exponential: f64::NAN,
            rate: f64::NAN,
        };
    }

    let rate = (v1 / v0).ln() / (t1 - t0);
    let exponential = v0 * (rate * (t2 - t0)).exp();

    Projection {
        linear,
        exponential,
        rate,
    }
}

/// Row-level form of `project`: `None` in means `None` out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowProjection {
    pub linear: Option<f64>,
    pub exponential: Option<f64>,
    pub rate: Option<f64>,
}

pub fn project_row(v0: Option<f64>, v1: Option<f64>, t0: f64, t1: f64, t2: f64) -> RowProjection {
    let (Some(v0), Some(v1)) = (v0, v1) else {
        return RowProjection::default();
    };
    let p = project(v0, v1, t0, t1, t2);
    RowProjection {
        linear: finite(p.linear),
        exponential: finite(p.exponential),
        rate: finite(p.rate),
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn linear_repeats_last_delta_regardless_of_horizon() {
        for &(v0, v1) in &[(0.7, 0.75), (-2.0, 3.0), (5.0, 1.0), (0.0, 0.0)] {
            for &t2 in &[2011.0, 2020.0, 2050.0] {
                let p = project(v0, v1, 2000.0, 2010.0, t2);
                assert!((p.linear - (v1 + (v1 - v0))).abs() < TOL);
            }
        }
    }

    #[test]
    fn exponential_follows_log_growth_rate() {
        let (v0, v1, t0, t1, t2) = (0.6, 0.72, 2000.0, 2010.0, 2025.0);
        let p = project(v0, v1, t0, t1, t2);
        let rate = (v1 / v0).ln() / (t1 - t0);
        assert!((p.rate - rate).abs() < TOL);
        assert!((p.exponential - v0 * (rate * (t2 - t0)).exp()).abs() < TOL);
    }

    #[test]
    fn exponential_is_consistent_at_last_observation() {
        let p = project(0.4, 0.9, 2000.0, 2010.0, 2010.0);
        assert!((p.exponential - 0.9).abs() < 1e-12);
    }

    #[test]
    fn reference_scenario() {
        let p = project(0.700, 0.750, 2000.0, 2010.0, 2020.0);
        assert!((p.linear - 0.800).abs() < 1e-12);
        assert!((p.rate - 0.006899).abs() < 1e-6, "rate = {}", p.rate);
        assert!((p.exponential - 0.8036).abs() < 1e-4, "exp = {}", p.exponential);
    }

    #[test]
    fn zero_base_keeps_linear_but_not_exponential() {
        let p = project(0.0, 0.5, 2000.0, 2010.0, 2020.0);
        assert!((p.linear - 1.0).abs() < TOL);
        assert!(p.exponential.is_nan());
        assert!(p.rate.is_nan());

        let p = project(0.5, -0.1, 2000.0, 2010.0, 2020.0);
        assert!(p.linear.is_finite());
        assert!(p.exponential.is_nan());
    }

    #[test]
    fn flat_series_has_zero_rate() {
        let p = project(0.81, 0.81, 2000.0, 2010.0, 2020.0);
        assert_eq!(p.rate, 0.0);
        assert_eq!(p.exponential, 0.81);
        assert_eq!(p.linear, 0.81);
    }

    #[test]
    fn non_finite_inputs_are_fully_undefined() {
        let p = project(f64::NAN, 0.5, 2000.0, 2010.0, 2020.0);
        assert!(p.linear.is_nan() && p.exponential.is_nan() && p.rate.is_nan());
        let p = project(0.5, f64::INFINITY, 2000.0, 2010.0, 2020.0);
        assert!(p.linear.is_nan());
    }

    #[test]
    fn row_projection_maps_undefined_to_none() {
        assert_eq!(project_row(None, Some(0.5), 2000.0, 2010.0, 2020.0), RowProjection::default());
        assert_eq!(project_row(Some(0.5), None, 2000.0, 2010.0, 2020.0), RowProjection::default());

        let r = project_row(Some(0.0), Some(0.5), 2000.0, 2010.0, 2020.0);
        assert_eq!(r.linear, Some(1.0));
        assert_eq!(r.exponential, None);
        assert_eq!(r.rate, None);
    }
}
