//! Pipeline metrics for observability
//!
//! Counters are monotonically increasing and read with relaxed ordering: they
//! are cheap to update on the hot path and only approximately synchronized
//! with delivery.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for an [`AsyncPipeline`](crate::core::AsyncPipeline)
///
/// # Example
///
/// ```
/// use sim_logger::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
///
/// metrics.record_dropped(1);
/// metrics.record_delivered();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.delivered_count(), 1);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Records lost to overflow, eviction, or shutdown
    dropped: AtomicU64,

    /// Records handed to the wrapped destination without error
    delivered: AtomicU64,

    /// Failed or panicking destination calls on the drain thread
    destination_failures: AtomicU64,

    /// Enqueue attempts that found the queue full
    overflow_events: AtomicU64,

    /// Flush barriers completed by the drain thread
    flushes_completed: AtomicU64,
}

impl PipelineMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dropped: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            destination_failures: AtomicU64::new(0),
            overflow_events: AtomicU64::new(0),
            flushes_completed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn destination_failures(&self) -> u64 {
        self.destination_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn overflow_events(&self) -> u64 {
        self.overflow_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flushes_completed(&self) -> u64 {
        self.flushes_completed.load(Ordering::Relaxed)
    }

    /// Add `count` dropped records, returning the previous total
    #[inline]
    pub fn record_dropped(&self, count: u64) -> u64 {
        self.dropped.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a destination failure, returning the previous total
    #[inline]
    pub fn record_destination_failure(&self) -> u64 {
        self.destination_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_overflow(&self) -> u64 {
        self.overflow_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_flush(&self) -> u64 {
        self.flushes_completed.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop rate as a percentage (0.0 - 100.0) of everything written
    ///
    /// Returns 0.0 if nothing has been written.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.delivered_count() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.dropped.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.destination_failures.store(0, Ordering::Relaxed);
        self.overflow_events.store(0, Ordering::Relaxed);
        self.flushes_completed.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            dropped: AtomicU64::new(self.dropped_count()),
            delivered: AtomicU64::new(self.delivered_count()),
            destination_failures: AtomicU64::new(self.destination_failures()),
            overflow_events: AtomicU64::new(self.overflow_events()),
            flushes_completed: AtomicU64::new(self.flushes_completed()),
        }
    }
}

/// Whether a rate-limited alert should fire for the counter value that was
/// current before this event: the first event and every 1000th after it.
#[inline]
pub(crate) fn should_alert(previous: u64) -> bool {
    previous == 0 || (previous + 1) % 1000 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.delivered_count(), 0);
        assert_eq!(metrics.destination_failures(), 0);
        assert_eq!(metrics.overflow_events(), 0);
        assert_eq!(metrics.flushes_completed(), 0);
    }

    #[test]
    fn test_record_dropped_returns_previous() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.record_dropped(1), 0);
        assert_eq!(metrics.record_dropped(2), 1);
        assert_eq!(metrics.dropped_count(), 3);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_delivered();
        }
        metrics.record_dropped(10);

        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = PipelineMetrics::new();
        metrics.record_dropped(1);
        metrics.record_flush();

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.flushes_completed(), 0);
        assert_eq!(snapshot.dropped_count(), 1);
        assert_eq!(snapshot.flushes_completed(), 1);
    }

    #[test]
    fn test_should_alert_rate_limit() {
        assert!(should_alert(0));
        assert!(!should_alert(1));
        assert!(!should_alert(500));
        assert!(should_alert(999));
        assert!(should_alert(1999));
    }
}
