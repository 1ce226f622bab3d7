//! Failure reporting for the bridge.
//!
//! No bridge operation returns an error to its caller. Every failure ends at
//! a `FailureSink`; the default sink writes it to the log.

use std::fmt;

use crate::error::BridgeError;

/// A failure the bridge absorbed instead of propagating.
#[derive(Debug)]
pub enum BridgeFailure {
    /// Listener registration failed during construction
    Setup(BridgeError),
    /// An outbound message could not be queued or emitted
    Emit(BridgeError),
}

impl BridgeFailure {
    pub fn error(&self) -> &BridgeError {
        match self {
            BridgeFailure::Setup(err) | BridgeFailure::Emit(err) => err,
        }
    }
}

impl fmt::Display for BridgeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeFailure::Setup(err) => write!(f, "Failed to initialize LSP event listener: {}", err),
            BridgeFailure::Emit(err) => write!(f, "Failed to emit LSP request: {}", err),
        }
    }
}

/// Destination for absorbed failures.
pub trait FailureSink: Send + Sync {
    fn report(&self, failure: BridgeFailure);
}

/// Sink that logs failures at ERROR level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FailureSink for LogSink {
    fn report(&self, failure: BridgeFailure) {
        log::error!(target: "lsp_event_bridge::bridge", "{}", failure);
    }
}
