//! Error handling types for lsp-event-bridge
//!
//! This module provides the error type shared by the event bus, the bridge
//! and configuration loading.

use thiserror::Error;

/// Comprehensive error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Registering a listener on a bus channel failed
    #[error("Failed to subscribe to channel {channel}: {message}")]
    Subscribe { channel: String, message: String },

    /// The bus rejected or failed to deliver an outbound event
    #[error("Failed to emit on channel {channel}: {message}")]
    Emit { channel: String, message: String },

    /// The event bus is no longer accepting events
    #[error("Event bus closed")]
    BusClosed,

    /// No Tokio runtime was available to run background tasks
    #[error("No async runtime available")]
    NoRuntime,

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Helper functions for common error patterns
impl BridgeError {
    /// Create a subscription error
    pub fn subscribe(channel: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Subscribe {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create an emission error
    pub fn emit(channel: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Emit {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }
}
