//! Frame timestamp builders.

/// `count` timestamps starting at `start_ms`, spaced `period_ms` apart.
///
/// # Example
///
/// ```rust
/// use pacer_test_helpers::timeline::uniform;
///
/// assert_eq!(uniform(0.0, 16.0, 3), vec![0.0, 16.0, 32.0]);
/// ```
#[must_use]
pub fn uniform(start_ms: f64, period_ms: f64, count: usize) -> Vec<f64> {
    let mut t = start_ms;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(t);
        t += period_ms;
    }
    out
}

/// Cumulative timestamps from a list of inter-frame intervals, starting at
/// `start_ms` (which is itself not included).
///
/// # Example
///
/// ```rust
/// use pacer_test_helpers::timeline::from_intervals;
///
/// assert_eq!(from_intervals(100.0, [10.0, 5.0]), vec![110.0, 115.0]);
/// ```
pub fn from_intervals<I>(start_ms: f64, intervals: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    intervals
        .into_iter()
        .scan(start_ms, |t, interval| {
            *t += interval;
            Some(*t)
        })
        .collect()
}
