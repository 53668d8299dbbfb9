//! Bounded intake queue between the HTTP handler and the dispatch loop

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{FlatEvent, QueueConfig};
use tracing::{debug, trace, warn};

use crate::config::{IngestionMetrics, OverflowPolicy};
use crate::error::{EnqueueError, Result};

/// Intake queue
///
/// Cheap to clone: every clone shares the same channel and metrics. The
/// queue only closes through [`IntakeQueue::close`], never because the
/// last handler clone was dropped.
#[derive(Debug, Clone)]
pub struct IntakeQueue {
    tx: Sender<FlatEvent>,
    rx: Receiver<FlatEvent>,
    policy: OverflowPolicy,
    metrics: Arc<IngestionMetrics>,
}

impl IntakeQueue {
    /// Create a queue; a capacity of 0 is raised to 1
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let (tx, rx) = bounded(capacity.max(1));

        Self {
            tx,
            rx,
            policy,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.capacity, config.overflow)
    }

    /// Hand one event to the dispatch loop, honouring the overflow policy
    ///
    /// # Errors
    /// - `Full` when the policy is `reject` and no slot is free
    /// - `Closed` after [`IntakeQueue::close`]
    pub async fn enqueue(&self, event: FlatEvent) -> Result<()> {
        self.metrics.record_received();

        let outcome = match self.policy {
            OverflowPolicy::Block => self.send_blocking(event).await,
            OverflowPolicy::Reject => self.send_or_reject(event),
            OverflowPolicy::DropOldest => self.send_evicting(event),
        };

        match &outcome {
            Ok(()) => self.metrics.record_enqueued(self.tx.len()),
            Err(EnqueueError::Full { .. }) => self.metrics.record_rejected("queue_full"),
            Err(EnqueueError::Closed) => self.metrics.record_rejected("closed"),
        }

        outcome
    }

    async fn send_blocking(&self, event: FlatEvent) -> Result<()> {
        self.tx.send(event).await.map_err(|_| EnqueueError::Closed)
    }

    fn send_or_reject(&self, event: FlatEvent) -> Result<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(capacity = self.capacity(), "Intake queue full, event rejected");
                Err(EnqueueError::Full {
                    capacity: self.capacity(),
                })
            }
            Err(TrySendError::Closed(_)) => Err(EnqueueError::Closed),
        }
    }

    fn send_evicting(&self, mut event: FlatEvent) -> Result<()> {
        loop {
            match self.tx.try_send(event) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(returned)) => {
                    event = returned;
                    // the dispatch loop may have taken it first; retry either way
                    if let Ok(evicted) = self.rx.try_recv() {
                        self.metrics.record_dropped();
                        trace!(event = %evicted.ev, "Oldest queued event evicted");
                    }
                }
                Err(TrySendError::Closed(_)) => return Err(EnqueueError::Closed),
            }
        }
    }

    /// Receiver side for the dispatch loop
    pub fn receiver(&self) -> Receiver<FlatEvent> {
        self.rx.clone()
    }

    /// Stop accepting events
    ///
    /// Already queued events stay receivable. Returns true if this call
    /// closed the queue.
    pub fn close(&self) -> bool {
        let closed = self.tx.close();
        if closed {
            debug!(pending = self.tx.len(), "Intake queue closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(name: &str) -> FlatEvent {
        FlatEvent {
            ev: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_enqueue_and_receive_in_order() {
        let queue = IntakeQueue::new(4, OverflowPolicy::Block);
        let rx = queue.receiver();

        queue.enqueue(event("a")).await.unwrap();
        queue.enqueue(event("b")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().ev, "a");
        assert_eq!(rx.recv().await.unwrap().ev, "b");
        assert_eq!(queue.metrics().snapshot().events_enqueued, 2);
    }

    #[tokio::test]
    async fn test_reject_when_full() {
        let queue = IntakeQueue::new(1, OverflowPolicy::Reject);

        queue.enqueue(event("a")).await.unwrap();
        let err = queue.enqueue(event("b")).await.unwrap_err();
        assert_eq!(err, EnqueueError::Full { capacity: 1 });

        let snapshot = queue.metrics().snapshot();
        assert_eq!(snapshot.events_received, 2);
        assert_eq!(snapshot.events_enqueued, 1);
        assert_eq!(snapshot.events_rejected, 1);
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_newest() {
        let queue = IntakeQueue::new(2, OverflowPolicy::DropOldest);
        let rx = queue.receiver();

        for name in ["a", "b", "c", "d"] {
            queue.enqueue(event(name)).await.unwrap();
        }

        assert_eq!(rx.recv().await.unwrap().ev, "c");
        assert_eq!(rx.recv().await.unwrap().ev, "d");
        assert!(rx.is_empty());
        assert_eq!(queue.metrics().snapshot().events_dropped, 2);
    }

    #[tokio::test]
    async fn test_block_waits_for_capacity() {
        let queue = IntakeQueue::new(1, OverflowPolicy::Block);
        let rx = queue.receiver();
        queue.enqueue(event("a")).await.unwrap();

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(event("b")).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        assert_eq!(rx.recv().await.unwrap().ev, "a");
        producer.await.unwrap().unwrap();
        assert_eq!(rx.recv().await.unwrap().ev, "b");
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let queue = IntakeQueue::new(4, OverflowPolicy::Block);
        let rx = queue.receiver();
        queue.enqueue(event("a")).await.unwrap();

        assert!(queue.close());
        assert!(!queue.close());
        assert_eq!(queue.enqueue(event("b")).await, Err(EnqueueError::Closed));

        assert_eq!(rx.recv().await.unwrap().ev, "a");
        assert!(rx.recv().await.is_err());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let queue = IntakeQueue::new(0, OverflowPolicy::Block);
        assert_eq!(queue.capacity(), 1);
    }
}
