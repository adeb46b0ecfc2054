//! Scenario Kernel: Arithmetic Primitives
//!
//! Every bounded scalar in the engine lives in a closed interval.
//! Clamping is part of every additive step, never an afterthought.

/// Lower bound shared by every metric and region value.
pub const UNIT_MIN: f64 = 0.0;

/// Upper bound for every metric except standard adoption.
pub const UNIT_MAX: f64 = 1.0;

/// Upper bound for `welfareStandardAdoption`. Scores normalise by it.
pub const ADOPTION_CAP: f64 = 3.0;

/// Clamp into `[lo, hi]`. Non-finite input collapses to `lo`.
pub fn clamp_range(value: f64, lo: f64, hi: f64) -> f64 {
    if !value.is_finite() {
        return lo;
    }
    value.clamp(lo, hi)
}

/// Clamp into `[0, 1]`.
pub fn clamp_unit(value: f64) -> f64 {
    clamp_range(value, UNIT_MIN, UNIT_MAX)
}

/// Treat a missing or non-finite reading as zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Adoption normalised onto `[0, 1]` (`value / 3`, capped at 1).
pub fn normalized_adoption(value: f64) -> f64 {
    clamp_unit(finite_or_zero(value) / ADOPTION_CAP)
}

/// Arithmetic mean. `None` for an empty input.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    for v in values {
        total += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

/// Float comparison with an absolute tolerance, for tests and reports.
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit_bounds() {
        assert_eq!(clamp_unit(1.2), 1.0);
        assert_eq!(clamp_unit(-0.4), 0.0);
        assert_eq!(clamp_unit(0.35), 0.35);
    }

    #[test]
    fn test_clamp_non_finite_goes_low() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_range(f64::INFINITY, 0.0, ADOPTION_CAP), 0.0);
    }

    #[test]
    fn test_normalized_adoption_caps_at_one() {
        assert!(approx_eq(normalized_adoption(1.5), 0.5, 1e-12));
        assert_eq!(normalized_adoption(4.5), 1.0);
        assert_eq!(normalized_adoption(f64::NAN), 0.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), None);
        assert!(approx_eq(mean(vec![0.2, 0.4]).unwrap(), 0.3, 1e-12));
    }
}
