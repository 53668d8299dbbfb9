//! Intake metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub use contracts::OverflowPolicy;

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Events decoded and offered to the queue
    pub events_received: AtomicU64,

    /// Events accepted by the queue
    pub events_enqueued: AtomicU64,

    /// Queued events evicted by `drop_oldest`
    pub events_dropped: AtomicU64,

    /// Events refused by `reject` or a closed queue
    pub events_rejected: AtomicU64,

    /// Bodies that failed to decode
    pub decode_errors: AtomicU64,

    /// Queue length after the last enqueue
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        observability::record_event_received();
    }

    pub fn record_enqueued(&self, queue_len: usize) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
        self.update_queue_len(queue_len);
    }

    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
        observability::record_event_dropped("evicted");
    }

    pub fn record_rejected(&self, reason: &'static str) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
        observability::record_event_dropped(reason);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        observability::record_decode_error();
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        observability::record_queue_depth(len);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_enqueued: u64,
    pub events_dropped: u64,
    pub events_rejected: u64,
    pub decode_errors: u64,
    pub queue_len: usize,
}
