//! Sink implementations
//!
//! Contains HttpSink and LogSink, plus the `Destination` enum the
//! dispatcher builds from configuration.

mod http;
mod log;

pub use self::http::{HttpSink, HttpSinkConfig};
pub use self::log::LogSink;

use contracts::{ContractError, DeliveryOutcome, DestinationConfig, EventSink, NestedEvent, SinkType};
use tracing::instrument;

use crate::error::DispatcherError;

/// Sink selected at runtime by `destination.kind`
pub enum Destination {
    Http(HttpSink),
    Log(LogSink),
}

impl EventSink for Destination {
    fn name(&self) -> &str {
        match self {
            Self::Http(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    async fn deliver(&self, event: &NestedEvent) -> Result<DeliveryOutcome, ContractError> {
        match self {
            Self::Http(sink) => sink.deliver(event).await,
            Self::Log(sink) => sink.deliver(event).await,
        }
    }
}

/// Create the destination sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.kind)
)]
pub fn create_sink(config: &DestinationConfig) -> Result<Destination, DispatcherError> {
    match config.kind {
        SinkType::Log => Ok(Destination::Log(LogSink::new(&config.name))),
        SinkType::Http => {
            let sink = HttpSink::from_destination(config)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Destination::Http(sink))
        }
    }
}
