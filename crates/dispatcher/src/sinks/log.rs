//! LogSink - logs an event summary via tracing

use contracts::{ContractError, DeliveryOutcome, EventSink, NestedEvent};
use tracing::{info, instrument};

/// Sink that logs event summaries instead of delivering them
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_event_summary(&self, event: &NestedEvent) {
        info!(
            sink = %self.name,
            event = %event.event,
            event_type = %event.event_type,
            app_id = %event.app_id,
            user_id = %event.user_id,
            attributes = event.attributes.len(),
            traits = event.traits.len(),
            "NestedEvent received"
        );
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, event),
        fields(sink = %self.name)
    )]
    async fn deliver(&self, event: &NestedEvent) -> Result<DeliveryOutcome, ContractError> {
        self.log_event_summary(event);
        Ok(DeliveryOutcome::Delivered)
    }
}
