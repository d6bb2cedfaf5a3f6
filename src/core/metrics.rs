//! Logger metrics for observability
//!
//! Counters describing how records moved through the engine: accepted by
//! `write`, dropped before fan-out, delivered to a transport, or failed there.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use logfan::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_written();
/// metrics.record_delivered();
///
/// assert_eq!(metrics.total_written(), 1);
/// assert_eq!(metrics.delivered(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that made it through the format pipeline
    written: AtomicU64,

    /// Records dropped before fan-out (silent, no transports, filtered)
    dropped_count: AtomicU64,

    /// Per-binding deliveries that succeeded
    delivered: AtomicU64,

    /// Per-binding deliveries that failed or panicked
    transport_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_written(&self) -> u64 {
        self.written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_transport_failure(&self) -> u64 {
        self.transport_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage (0.0 - 100.0) of all attempts
    ///
    /// Returns 0.0 if nothing has been delivered yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.transport_failures() as f64;
        let total = self.delivered() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.written.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            written: AtomicU64::new(self.total_written()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            delivered: AtomicU64::new(self.delivered()),
            transport_failures: AtomicU64::new(self.transport_failures()),
        }
    }
}
