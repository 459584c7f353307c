//! Error types for smsrelay

use thiserror::Error;

/// Result type alias using smsrelay's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for smsrelay operations
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound webhook body could not be decoded
    #[error("Invalid alert payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but failed validation
    #[error("validation failed on field '{field}': {reason}")]
    ConfigValidation { field: String, reason: String },

    /// The provider content type has no body encoder
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Network failure or timeout while talking to the provider
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with something other than 200
    #[error("request failed with status : {status}")]
    ProviderStatus { status: String },

    /// The dispatch queue is saturated
    #[error("dispatch queue is full")]
    QueueFull,

    /// The dispatch workers are gone
    #[error("dispatch queue is closed")]
    QueueClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a provider status error from a status line
    pub fn provider_status(status: impl Into<String>) -> Self {
        Self::ProviderStatus {
            status: status.into(),
        }
    }
}
