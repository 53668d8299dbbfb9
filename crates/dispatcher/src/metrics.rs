//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use observability::{RunningStats, StatsSummary};

/// Metrics shared by the dispatch loop and its delivery tasks
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Records handed to a delivery task
    dispatched: AtomicU64,
    /// Destination answered 200
    delivered: AtomicU64,
    /// Destination answered anything else
    rejected: AtomicU64,
    /// Serialization or transport failure
    failed: AtomicU64,
    /// Overwritten triple slots
    key_collisions: AtomicU64,
    /// Deliveries currently running
    in_flight: AtomicUsize,
    /// Round-trip latency of deliveries that reached the destination
    latency_ms: Mutex<RunningStats>,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_started(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        observability::record_in_flight(now);
    }

    pub fn task_finished(&self) {
        let now = self.in_flight.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        observability::record_in_flight(now);
    }

    pub fn record_delivered(&self, sink: &str, latency_ms: f64) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.push_latency(latency_ms);
        observability::record_delivery(sink, "delivered");
    }

    pub fn record_rejected(&self, sink: &str, latency_ms: f64) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        self.push_latency(latency_ms);
        observability::record_delivery(sink, "rejected");
    }

    pub fn record_failed(&self, sink: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        observability::record_delivery(sink, "failed");
    }

    pub fn record_key_collision(&self, group: &'static str) {
        self.key_collisions.fetch_add(1, Ordering::Relaxed);
        observability::record_key_collision(group);
    }

    fn push_latency(&self, latency_ms: f64) {
        observability::record_delivery_latency_ms(latency_ms);
        if let Ok(mut stats) = self.latency_ms.lock() {
            stats.push(latency_ms);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency_ms = self
            .latency_ms
            .lock()
            .map(|stats| stats.summary())
            .unwrap_or_default();

        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            key_collisions: self.key_collisions.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
            latency_ms,
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub failed: u64,
    pub key_collisions: u64,
    pub in_flight: usize,
    pub latency_ms: StatsSummary,
}
