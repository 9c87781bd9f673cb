//! Inter-tick interval statistics.
//!
//! Every engine records the interval behind each dispatched `update`, plus
//! the steps it accepted but did not dispatch (paused or unfocused) and the
//! catch-up steps it dropped.

use serde::Serialize;

const DEFAULT_MAX_SAMPLES: usize = 1024;

/// Tick interval statistics for one engine.
///
/// Percentiles are computed over a bounded ring buffer of recent intervals;
/// the counters cover the engine's whole lifetime.
#[derive(Debug, Clone)]
pub struct IntervalStats {
    /// Ticks that dispatched `update`.
    pub dispatched_ticks: u64,

    /// Ticks accepted while paused or unfocused, without dispatch.
    pub suppressed_ticks: u64,

    /// Fixed steps discarded by the catch-up cap.
    pub dropped_steps: u64,

    /// Interval behind the most recent dispatched tick (ms).
    pub last_interval_ms: f64,

    /// Largest interval observed behind a dispatched tick (ms).
    pub max_interval_ms: f64,

    /// Sum of all dispatched intervals (ms).
    interval_sum_ms: f64,

    /// Recent intervals (ring buffer).
    recent_intervals: Vec<f64>,

    max_samples: usize,

    next_sample_index: usize,

    /// Reused scratch storage for percentile selection.
    percentile_scratch: Vec<f64>,
}

impl Default for IntervalStats {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SAMPLES)
    }
}

impl IntervalStats {
    /// Create statistics with the default sample capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create statistics retaining at most `max_samples` recent intervals.
    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            dispatched_ticks: 0,
            suppressed_ticks: 0,
            dropped_steps: 0,
            last_interval_ms: 0.0,
            max_interval_ms: 0.0,
            interval_sum_ms: 0.0,
            recent_intervals: Vec::with_capacity(max_samples),
            max_samples,
            next_sample_index: 0,
            percentile_scratch: Vec::new(),
        }
    }

    /// Record a dispatched tick and the interval behind it.
    pub fn record_dispatch(&mut self, interval_ms: f64) {
        self.dispatched_ticks += 1;
        self.last_interval_ms = interval_ms;
        self.max_interval_ms = self.max_interval_ms.max(interval_ms);
        self.interval_sum_ms += interval_ms;

        if self.max_samples == 0 {
            return;
        }

        if self.recent_intervals.len() < self.max_samples {
            self.recent_intervals.push(interval_ms);
            if self.recent_intervals.len() == self.max_samples {
                self.next_sample_index = 0;
            }
        } else if let Some(slot) = self.recent_intervals.get_mut(self.next_sample_index) {
            *slot = interval_ms;
            self.next_sample_index = (self.next_sample_index + 1) % self.max_samples;
        }
    }

    /// Record a tick that was accepted but not dispatched.
    pub fn record_suppressed(&mut self) {
        self.suppressed_ticks += 1;
    }

    /// Record catch-up steps that were discarded.
    pub fn record_dropped(&mut self, steps: u64) {
        self.dropped_steps = self.dropped_steps.saturating_add(steps);
    }

    /// Interval at `percentile` (0.0 to 1.0) over recent samples, or 0.
    pub fn percentile_interval_ms(&mut self, percentile: f64) -> f64 {
        if self.recent_intervals.is_empty() {
            return 0.0;
        }

        let percentile = percentile.clamp(0.0, 1.0);

        self.percentile_scratch.clear();
        self.percentile_scratch
            .extend_from_slice(&self.recent_intervals);

        let len = self.percentile_scratch.len();
        let index = percentile_index(len, percentile);
        let (_, value, _) = self
            .percentile_scratch
            .select_nth_unstable_by(index, f64::total_cmp);
        *value
    }

    /// Median interval (ms).
    pub fn p50_interval_ms(&mut self) -> f64 {
        self.percentile_interval_ms(0.50)
    }

    /// 95th percentile interval (ms).
    pub fn p95_interval_ms(&mut self) -> f64 {
        self.percentile_interval_ms(0.95)
    }

    /// 99th percentile interval (ms).
    pub fn p99_interval_ms(&mut self) -> f64 {
        self.percentile_interval_ms(0.99)
    }

    /// Mean interval over all dispatched ticks (ms).
    pub fn average_interval_ms(&self) -> f64 {
        if self.dispatched_ticks == 0 {
            return 0.0;
        }
        self.interval_sum_ms / self.dispatched_ticks as f64
    }

    /// Mean dispatch rate implied by the average interval (Hz).
    pub fn average_rate_hz(&self) -> f64 {
        let average = self.average_interval_ms();
        if average > 0.0 { 1000.0 / average } else { 0.0 }
    }

    /// Fraction of accepted ticks that were suppressed (0.0 to 1.0).
    pub fn suppressed_rate(&self) -> f64 {
        let accepted = self.dispatched_ticks + self.suppressed_ticks;
        if accepted == 0 {
            0.0
        } else {
            self.suppressed_ticks as f64 / accepted as f64
        }
    }

    /// Number of intervals currently retained.
    pub fn sample_count(&self) -> usize {
        self.recent_intervals.len()
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        self.dispatched_ticks = 0;
        self.suppressed_ticks = 0;
        self.dropped_steps = 0;
        self.last_interval_ms = 0.0;
        self.max_interval_ms = 0.0;
        self.interval_sum_ms = 0.0;
        self.recent_intervals.clear();
        self.next_sample_index = 0;
        self.percentile_scratch.clear();
    }

    /// Snapshot of the headline numbers, suitable for reporting.
    pub fn summary(&mut self) -> IntervalSummary {
        IntervalSummary {
            dispatched_ticks: self.dispatched_ticks,
            suppressed_ticks: self.suppressed_ticks,
            dropped_steps: self.dropped_steps,
            average_rate_hz: self.average_rate_hz(),
            p50_interval_ms: self.p50_interval_ms(),
            p95_interval_ms: self.p95_interval_ms(),
            p99_interval_ms: self.p99_interval_ms(),
            max_interval_ms: self.max_interval_ms,
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "percentile is clamped to [0, 1] and len is a buffer length"
)]
fn percentile_index(len: usize, percentile: f64) -> usize {
    ((len as f64 * percentile) as usize).min(len.saturating_sub(1))
}

/// Serializable snapshot of [`IntervalStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalSummary {
    /// Ticks that dispatched `update`.
    pub dispatched_ticks: u64,
    /// Ticks accepted without dispatch.
    pub suppressed_ticks: u64,
    /// Catch-up steps discarded.
    pub dropped_steps: u64,
    /// Mean dispatch rate (Hz).
    pub average_rate_hz: f64,
    /// Median interval (ms).
    pub p50_interval_ms: f64,
    /// 95th percentile interval (ms).
    pub p95_interval_ms: f64,
    /// 99th percentile interval (ms).
    pub p99_interval_ms: f64,
    /// Largest interval (ms).
    pub max_interval_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let stats = IntervalStats::new();
        assert_eq!(stats.dispatched_ticks, 0);
        assert_eq!(stats.suppressed_ticks, 0);
        assert_eq!(stats.sample_count(), 0);
    }

    #[test]
    fn test_record_dispatch() {
        let mut stats = IntervalStats::new();

        stats.record_dispatch(16.0);
        stats.record_dispatch(17.0);
        stats.record_dispatch(50.0);

        assert_eq!(stats.dispatched_ticks, 3);
        assert!((stats.max_interval_ms - 50.0).abs() < f64::EPSILON);
        assert!((stats.last_interval_ms - 50.0).abs() < f64::EPSILON);
        assert!((stats.average_interval_ms() - 83.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_rate() {
        let mut stats = IntervalStats::new();
        for _ in 0..10 {
            stats.record_dispatch(100.0);
        }
        assert!((stats.average_rate_hz() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_suppressed_rate() {
        let mut stats = IntervalStats::new();
        assert!(stats.suppressed_rate().abs() < f64::EPSILON);

        stats.record_dispatch(10.0);
        stats.record_suppressed();
        stats.record_suppressed();
        stats.record_dispatch(10.0);

        assert!((stats.suppressed_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_percentiles() {
        let mut stats = IntervalStats::new();
        for i in 1..=100 {
            stats.record_dispatch(f64::from(i));
        }

        let p50 = stats.p50_interval_ms();
        let p99 = stats.p99_interval_ms();
        assert!((50.0..=52.0).contains(&p50), "p50 was {p50}");
        assert!((98.0..=100.0).contains(&p99), "p99 was {p99}");
    }

    #[test]
    fn test_ring_buffer_behavior() {
        let mut stats = IntervalStats::with_capacity(3);
        for i in 1..=5 {
            stats.record_dispatch(f64::from(i));
        }

        assert_eq!(stats.sample_count(), 3);
        let mut retained = stats.recent_intervals.clone();
        retained.sort_by(f64::total_cmp);
        assert_eq!(retained, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_zero_capacity() {
        let mut stats = IntervalStats::with_capacity(0);
        stats.record_dispatch(10.0);

        assert_eq!(stats.dispatched_ticks, 1);
        assert_eq!(stats.sample_count(), 0);
        assert!(stats.p99_interval_ms().abs() < f64::EPSILON);
    }

    #[test]
    fn test_dropped_steps_saturate() {
        let mut stats = IntervalStats::new();
        stats.record_dropped(u64::MAX);
        stats.record_dropped(5);
        assert_eq!(stats.dropped_steps, u64::MAX);
    }

    #[test]
    fn test_reset() {
        let mut stats = IntervalStats::new();
        stats.record_dispatch(10.0);
        stats.record_suppressed();
        stats.record_dropped(3);

        stats.reset();

        assert_eq!(stats.dispatched_ticks, 0);
        assert_eq!(stats.suppressed_ticks, 0);
        assert_eq!(stats.dropped_steps, 0);
        assert_eq!(stats.sample_count(), 0);
    }

    #[test]
    fn test_summary() {
        let mut stats = IntervalStats::new();
        for _ in 0..4 {
            stats.record_dispatch(20.0);
        }
        let summary = stats.summary();
        assert_eq!(summary.dispatched_ticks, 4);
        assert!((summary.average_rate_hz - 50.0).abs() < 1e-9);
        assert!((summary.p95_interval_ms - 20.0).abs() < f64::EPSILON);
    }
}
