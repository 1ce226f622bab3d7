//! Outbound queue and writer task for the request channel.
//!
//! Every outbound message passes through one unbounded FIFO queue drained by a
//! single writer task, so emissions reach the bus in the order `send` was
//! called even though each emission is asynchronous.
//!
//! # Shutdown
//!
//! The writer stops when the queue's sender is dropped (the bridge went away)
//! after emitting whatever was still queued. `dispose()` does not stop it:
//! sends after dispose are still attempted.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::failure::{BridgeFailure, FailureSink};
use crate::bus::EventBus;
use crate::error::{BridgeError, BridgeResult};

/// Message waiting to be emitted on the request channel.
#[derive(Debug)]
pub(crate) enum OutboundMessage {
    /// Fire-and-forget message from `send`.
    Message(String),

    /// Message whose sender waits until the bus accepted (or rejected) it.
    Awaited {
        payload: String,
        done: oneshot::Sender<()>,
    },
}

/// Producer side of the outbound queue.
pub(crate) struct OutboundQueue {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    channel: String,
    /// Held so the writer stays associated with its queue; never awaited.
    _writer: Option<JoinHandle<()>>,
}

impl OutboundQueue {
    /// Create the queue and, when a runtime is available, its writer task.
    ///
    /// Without a runtime the receiver is dropped immediately and every
    /// enqueue fails as closed.
    pub(crate) fn start<B: EventBus>(
        runtime: Option<&Handle>,
        bus: Arc<B>,
        channel: String,
        sink: Arc<dyn FailureSink>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = runtime
            .map(|handle| handle.spawn(writer_loop(bus, channel.clone(), rx, sink)));
        Self {
            tx,
            channel,
            _writer: writer,
        }
    }

    /// Queue a message without waiting. Fails only once the writer is gone.
    pub(crate) fn enqueue(&self, message: String) -> BridgeResult<()> {
        self.push(OutboundMessage::Message(message))
    }

    /// Queue a message behind everything already queued.
    ///
    /// The returned receiver resolves once the writer has handed the message
    /// to the bus.
    pub(crate) fn enqueue_awaited(&self, payload: String) -> BridgeResult<oneshot::Receiver<()>> {
        let (done, done_rx) = oneshot::channel();
        self.push(OutboundMessage::Awaited { payload, done })?;
        Ok(done_rx)
    }

    fn push(&self, message: OutboundMessage) -> BridgeResult<()> {
        self.tx
            .send(message)
            .map_err(|_| BridgeError::emit(&self.channel, "writer channel closed"))
    }
}

/// The main writer loop - emits queued messages one at a time.
async fn writer_loop<B: EventBus>(
    bus: Arc<B>,
    channel: String,
    mut rx: mpsc::UnboundedReceiver<OutboundMessage>,
    sink: Arc<dyn FailureSink>,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            OutboundMessage::Message(payload) => {
                emit_message(bus.as_ref(), &channel, payload, sink.as_ref()).await;
            }
            OutboundMessage::Awaited { payload, done } => {
                emit_message(bus.as_ref(), &channel, payload, sink.as_ref()).await;
                // Sender may have stopped waiting
                let _ = done.send(());
            }
        }
    }

    debug!(
        target: "lsp_event_bridge::bridge::writer",
        "Writer channel closed, stopping"
    );
}

/// Emit a single message, reporting failure to the sink.
async fn emit_message<B: EventBus>(
    bus: &B,
    channel: &str,
    payload: String,
    sink: &dyn FailureSink,
) {
    if let Err(e) = bus.emit(channel, Value::String(payload)).await {
        warn!(
            target: "lsp_event_bridge::bridge::writer",
            "Emit error on {}: {}",
            channel,
            e
        );
        sink.report(BridgeFailure::Emit(e));
    }
}
