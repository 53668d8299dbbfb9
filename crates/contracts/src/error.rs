//! Layered error definitions
//!
//! Categorized by source: config / serialize / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Delivery Errors =====
    /// Nested event could not be serialized
    #[error("serialize error: {message}")]
    Serialize { message: String },

    /// Request could not be built or sent
    #[error("sink '{sink_name}' transport error: {message}")]
    SinkTransport { sink_name: String, message: String },

    /// Sink could not be constructed from its configuration
    #[error("sink '{sink_name}' setup error: {message}")]
    SinkSetup { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create serialize error
    pub fn serialize(message: impl Into<String>) -> Self {
        Self::Serialize {
            message: message.into(),
        }
    }

    /// Create sink transport error
    pub fn sink_transport(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkTransport {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink setup error
    pub fn sink_setup(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkSetup {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
