//! Relay run statistics.

use std::time::Duration;

use dispatcher::DispatchSummary;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Intake side counters
    pub ingestion: ingestion::MetricsSnapshot,

    /// Dispatch side counters
    pub dispatch: DispatchSummary,
}

impl PipelineStats {
    /// Accepted events per second over the run
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ingestion.events_enqueued as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of dispatched events that did not get a 200, as percentage
    pub fn failure_rate(&self) -> f64 {
        let m = &self.dispatch.metrics;
        if m.dispatched > 0 {
            ((m.rejected + m.failed) as f64 / m.dispatched as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let intake = &self.ingestion;
        println!("📊 Intake");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Received: {}", intake.events_received);
        println!("   ├─ Enqueued: {}", intake.events_enqueued);
        println!("   ├─ Decode errors: {}", intake.decode_errors);
        println!("   ├─ Rejected (queue full / closed): {}", intake.events_rejected);
        println!("   ├─ Dropped (oldest evicted): {}", intake.events_dropped);
        println!("   └─ Events/s: {:.2}", self.events_per_sec());

        let m = &self.dispatch.metrics;
        println!("\n📤 Dispatch");
        println!("   ├─ Dispatched: {}", m.dispatched);
        println!("   ├─ Delivered: {}", m.delivered);
        println!("   ├─ Non-OK responses: {}", m.rejected);
        println!("   ├─ Failed: {}", m.failed);
        println!("   ├─ Failure rate: {:.2}%", self.failure_rate());
        println!("   ├─ Key collisions: {}", m.key_collisions);
        println!("   ├─ Latency (ms): {}", m.latency_ms);
        println!("   └─ Abandoned at shutdown: {}", self.dispatch.abandoned);

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate() {
        let mut stats = PipelineStats::default();
        assert_eq!(stats.failure_rate(), 0.0);

        stats.dispatch.metrics.dispatched = 4;
        stats.dispatch.metrics.delivered = 3;
        stats.dispatch.metrics.failed = 1;
        assert!((stats.failure_rate() - 25.0).abs() < f64::EPSILON);
    }
}
