//! RelayBlueprint - Config Loader output
//!
//! Describes the whole relay: listener, intake queue, dispatch concurrency,
//! destination and mapping policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP intake listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Intake queue between the handler and the dispatch loop
    #[serde(default)]
    pub queue: QueueConfig,

    /// Dispatch loop settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Where nested events are delivered
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Schema mapping options
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Metrics exporter
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Maximum accepted request body size in bytes, unlimited when absent
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: None,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

/// Intake queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Behaviour when the queue is full
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            overflow: OverflowPolicy::default(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

/// Overflow policy of the intake queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait for free capacity before answering the caller
    #[default]
    Block,
    /// Refuse the event, the caller gets 503
    Reject,
    /// Evict the oldest queued event to make room
    DropOldest,
}

/// Dispatch loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of concurrent deliveries
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// How long shutdown waits for in-flight deliveries
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

fn default_max_in_flight() -> usize {
    64
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

/// Destination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Sink name (used for logging/metrics)
    #[serde(default = "default_destination_name")]
    pub name: String,

    /// Sink type
    #[serde(default)]
    pub kind: SinkType,

    /// Target URL (http sink only)
    #[serde(default)]
    pub url: String,

    /// Per-request timeout, none when absent
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Extra static request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            name: default_destination_name(),
            kind: SinkType::default(),
            url: String::new(),
            timeout_ms: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_destination_name() -> String {
    "destination".to_string()
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// JSON POST to `destination.url`
    #[default]
    Http,
    /// Log a summary line, nothing leaves the process
    Log,
}

/// Mapping configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub key_policy: KeyPolicy,
}

/// How triples are folded into the attribute / trait mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Insert every triple in slot order, later slots overwrite earlier ones.
    /// Omitted slots collapse into a single empty-string key.
    #[default]
    LastWriteWins,
    /// Like `LastWriteWins`, but triples with an empty key are skipped
    SkipEmptyKeys,
}

/// Metrics exporter settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Prometheus endpoint port, disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let bp = RelayBlueprint::default();
        assert_eq!(bp.server.listen, "0.0.0.0:8080");
        assert_eq!(bp.queue.capacity, 1024);
        assert_eq!(bp.queue.overflow, OverflowPolicy::Block);
        assert_eq!(bp.dispatch.max_in_flight, 64);
        assert_eq!(bp.destination.kind, SinkType::Http);
        assert!(bp.destination.timeout_ms.is_none());
        assert_eq!(bp.mapping.key_policy, KeyPolicy::LastWriteWins);
        assert!(bp.server.max_body_bytes.is_none());
        assert!(bp.observability.metrics_port.is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let bp: RelayBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(bp.dispatch.shutdown_grace_ms, 5000);
        assert_eq!(bp.destination.name, "destination");
    }

    #[test]
    fn test_optional_limits() {
        let bp: RelayBlueprint = serde_json::from_str(
            r#"{"server":{"max_body_bytes":4096},"observability":{"metrics_port":9000}}"#,
        )
        .unwrap();
        assert_eq!(bp.server.max_body_bytes, Some(4096));
        assert_eq!(bp.observability.metrics_port, Some(9000));
    }

    #[test]
    fn test_policy_names() {
        let q: QueueConfig = serde_json::from_str(r#"{"overflow":"drop_oldest"}"#).unwrap();
        assert_eq!(q.overflow, OverflowPolicy::DropOldest);
        let m: MappingConfig = serde_json::from_str(r#"{"key_policy":"skip_empty_keys"}"#).unwrap();
        assert_eq!(m.key_policy, KeyPolicy::SkipEmptyKeys);
    }
}
