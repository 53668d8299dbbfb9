//! # Ingestion
//!
//! Webhook intake module.
//!
//! Responsibilities:
//! - Serve `POST /webhook` and decode bodies into `FlatEvent`
//! - Bounded intake queue with an explicit overflow policy
//! - Hand events to the dispatch loop via async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{intake_router, serve, IntakeQueue, IntakeState, OverflowPolicy};
//!
//! let queue = IntakeQueue::new(1024, OverflowPolicy::Block);
//! let rx = queue.receiver();
//! let router = intake_router(IntakeState::new(queue.clone(), None));
//! tokio::spawn(serve(listener, router, shutdown.clone()));
//!
//! while let Ok(event) = rx.recv().await {
//!     // map and deliver
//! }
//! ```

mod config;
mod error;
mod handler;
mod queue;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot, OverflowPolicy};
pub use contracts::FlatEvent;
pub use error::{EnqueueError, Result};
pub use handler::{intake_router, serve, IntakeState, SUCCESS_BODY};
pub use queue::IntakeQueue;
