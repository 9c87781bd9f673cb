//! Assertion macros for tick-timing tests.

/// Assert that two floating-point values are approximately equal.
///
/// # Example
///
/// ```rust
/// use pacer_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(1000.0 / 30.0, 33.333, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let tolerance: f64 = $tolerance;
        let diff = (left - right).abs();
        if !(diff <= tolerance) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`",
                left, right, diff, tolerance
            );
        }
    };
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let tolerance: f64 = $tolerance;
        let diff = (left - right).abs();
        if !(diff <= tolerance) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`: {}",
                left, right, diff, tolerance, format_args!($($arg)+)
            );
        }
    };
}

/// Assert that consecutive timestamps are separated by strictly more than `gap`.
///
/// # Example
///
/// ```rust
/// use pacer_test_helpers::assert_spaced_beyond;
///
/// assert_spaced_beyond!(&[0.0, 40.0, 80.5], 33.3);
/// ```
#[macro_export]
macro_rules! assert_spaced_beyond {
    ($timestamps:expr, $gap:expr $(,)?) => {
        let timestamps: &[f64] = $timestamps;
        let gap: f64 = $gap;
        for (i, pair) in timestamps.windows(2).enumerate() {
            if let [prev, curr] = pair {
                if !(curr - prev > gap) {
                    panic!(
                        "assertion failed: ticks too close\n  index {}: {:?} -> {:?} (spacing {:?} <= gap {:?})",
                        i,
                        prev,
                        curr,
                        curr - prev,
                        gap
                    );
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_passes() {
        assert_approx_eq!(0.1 + 0.2, 0.3, 1e-12);
    }

    #[test]
    #[should_panic(expected = "left ≈ right")]
    fn test_approx_eq_fails() {
        assert_approx_eq!(1.0, 1.1, 0.01);
    }

    #[test]
    #[should_panic(expected = "left ≈ right")]
    fn test_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.01);
    }

    #[test]
    fn test_spaced_beyond_passes() {
        assert_spaced_beyond!(&[50.0, 100.0, 150.5], 33.4);
        assert_spaced_beyond!(&[], 10.0);
    }

    #[test]
    #[should_panic(expected = "ticks too close")]
    fn test_spaced_beyond_fails_on_equal_gap() {
        assert_spaced_beyond!(&[0.0, 100.0], 100.0);
    }
}
