//! EventSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for delivery destinations.

use crate::{ContractError, NestedEvent};

/// Result of a delivery that reached the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Destination answered 200
    Delivered,
    /// Destination answered with any other status
    Rejected { status: u16 },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Data output trait
///
/// One sink instance is shared by every concurrent delivery task, so
/// `deliver` takes `&self`.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one nested event, exactly one attempt
    ///
    /// # Errors
    /// Serialization or transport failure (should include context)
    async fn deliver(&self, event: &NestedEvent) -> Result<DeliveryOutcome, ContractError>;
}
