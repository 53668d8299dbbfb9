//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 消费入口队列中的 `FlatEvent`
//! - 每个事件一个投递任务，并发数有上限
//! - 映射为 `NestedEvent` 并投递到目标 sink
//! - 投递失败只记录，不重试、不影响其他任务

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use contracts::{DeliveryOutcome, EventSink, NestedEvent};
pub use dispatcher::{DispatchLoop, DispatchSummary};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use sinks::{create_sink, Destination, HttpSink, HttpSinkConfig, LogSink};
