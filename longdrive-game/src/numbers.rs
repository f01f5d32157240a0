//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a non-negative f64 into a u64, returning 0 for negative or non-finite values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).floor()).unwrap_or(0)
}

/// Round a f64 and clamp it to the u64 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u64>(clamped).unwrap_or(0)
}

/// Ceil a f64 into a usize, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<usize, f64>(usize::MAX).unwrap_or(f64::MAX);
    cast::<f64, usize>(value.min(max).ceil()).unwrap_or(0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_negative_and_non_finite() {
        assert_eq!(floor_f64_to_u64(12.9), 12);
        assert_eq!(floor_f64_to_u64(-3.0), 0);
        assert_eq!(floor_f64_to_u64(f64::NAN), 0);
        assert_eq!(floor_f64_to_u64(f64::INFINITY), 0);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_u64(149.5), 150);
        assert_eq!(round_f64_to_u64(f64::NAN), 0);
        assert_eq!(round_f64_to_u64(-7.0), 0);
    }

    #[test]
    fn ceil_to_usize_rounds_up() {
        assert_eq!(ceil_f64_to_usize(1.2), 2);
        assert_eq!(ceil_f64_to_usize(0.0), 0);
        assert_eq!(ceil_f64_to_usize(f64::NAN), 0);
    }
}
