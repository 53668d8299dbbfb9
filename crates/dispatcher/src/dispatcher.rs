//! DispatchLoop - drains the intake queue, one delivery task per event

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::Receiver;
use contracts::{DeliveryOutcome, DispatchConfig, EventSink, FlatEvent};
use mapper::{key_collisions, Mapper};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// Outcome of a dispatch loop run
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    /// Final metrics
    pub metrics: MetricsSnapshot,
    /// Deliveries still running when the grace period ran out
    pub abandoned: usize,
}

/// The dispatch loop
///
/// Holds at most `max_in_flight` delivery tasks; while all permits are
/// taken it stops receiving and events wait in the intake queue.
pub struct DispatchLoop<S> {
    rx: Receiver<FlatEvent>,
    sink: Arc<S>,
    mapper: Mapper,
    permits: Arc<Semaphore>,
    shutdown_grace: Duration,
    metrics: Arc<DispatchMetrics>,
}

impl<S> DispatchLoop<S>
where
    S: EventSink + Sync + 'static,
{
    /// Create a dispatch loop; a `max_in_flight` of 0 is raised to 1
    pub fn new(rx: Receiver<FlatEvent>, sink: S, mapper: Mapper, config: &DispatchConfig) -> Self {
        Self {
            rx,
            sink: Arc::new(sink),
            mapper,
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            shutdown_grace: Duration::from_millis(config.shutdown_grace_ms),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Get metrics handle
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the dispatch loop
    ///
    /// Returns once the intake queue is closed and drained and in-flight
    /// deliveries finished or the grace period elapsed.
    #[instrument(name = "dispatch_loop_run", skip(self), fields(sink = %self.sink.name()))]
    pub async fn run(self) -> DispatchSummary {
        info!(
            max_in_flight = self.permits.available_permits(),
            key_policy = ?self.mapper.policy(),
            "Dispatch loop started"
        );

        let mut tasks = JoinSet::new();
        let mut received: u64 = 0;

        loop {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let Ok(event) = self.rx.recv().await else {
                break;
            };
            received += 1;

            tasks.spawn(deliver_one(
                Arc::clone(&self.sink),
                self.mapper,
                Arc::clone(&self.metrics),
                event,
                permit,
            ));

            while let Some(result) = tasks.try_join_next() {
                log_join_result(result);
            }

            if received % 100 == 0 {
                debug!(events = received, in_flight = tasks.len(), "Dispatch progress");
            }
        }

        info!(
            events = received,
            in_flight = tasks.len(),
            "Intake queue closed, waiting for in-flight deliveries"
        );

        let abandoned = Self::drain(tasks, self.shutdown_grace).await;
        let summary = DispatchSummary {
            metrics: self.metrics.snapshot(),
            abandoned,
        };

        info!(
            delivered = summary.metrics.delivered,
            rejected = summary.metrics.rejected,
            failed = summary.metrics.failed,
            abandoned,
            "Dispatch loop shutdown complete"
        );

        summary
    }

    /// Spawn the dispatch loop as a background task
    pub fn spawn(self) -> JoinHandle<DispatchSummary> {
        tokio::spawn(self.run())
    }

    async fn drain(mut tasks: JoinSet<()>, grace: Duration) -> usize {
        let wait_all = async {
            while let Some(result) = tasks.join_next().await {
                log_join_result(result);
            }
        };

        if tokio::time::timeout(grace, wait_all).await.is_ok() {
            return 0;
        }

        let abandoned = tasks.len();
        warn!(
            abandoned,
            grace_ms = grace.as_millis() as u64,
            "Grace period elapsed, abandoning in-flight deliveries"
        );
        tasks.abort_all();
        abandoned
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = ?e, "Delivery task panicked");
        }
    }
}

/// Map one event and make a single delivery attempt
#[instrument(
    name = "dispatch_deliver",
    skip_all,
    fields(sink = %sink.name(), event = %flat.ev)
)]
async fn deliver_one<S: EventSink>(
    sink: Arc<S>,
    mapper: Mapper,
    metrics: Arc<DispatchMetrics>,
    flat: FlatEvent,
    _permit: OwnedSemaphorePermit,
) {
    metrics.task_started();

    for collision in key_collisions(&flat, mapper.policy()) {
        debug!(
            group = %collision.group,
            key = %collision.key,
            overwritten_slot = collision.overwritten_slot,
            winning_slot = collision.winning_slot,
            "Triple key overwritten during mapping"
        );
        metrics.record_key_collision(collision.group.as_str());
    }

    let nested = mapper.map(flat);
    let started = Instant::now();

    match sink.deliver(&nested).await {
        Ok(DeliveryOutcome::Delivered) => {
            metrics.record_delivered(sink.name(), elapsed_ms(started));
        }
        Ok(DeliveryOutcome::Rejected { status }) => {
            warn!(status, "Received non-OK response");
            metrics.record_rejected(sink.name(), elapsed_ms(started));
        }
        Err(e) => {
            error!(error = %e, "Delivery failed");
            metrics.record_failed(sink.name());
        }
    }

    metrics.task_finished();
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
