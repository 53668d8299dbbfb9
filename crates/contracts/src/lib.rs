//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! - `FlatEvent`: decoded by ingestion, consumed once by the mapper
//! - `NestedEvent`: produced by the mapper, serialized once by a sink

mod blueprint;
mod error;
mod event;
mod nested;
mod sink;

pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use nested::*;
pub use sink::*;
