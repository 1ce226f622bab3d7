//! Contracts between the editor's language client and whatever carries its
//! messages.
//!
//! The client only knows how to push strings out and have strings pushed in.
//! `Transport` is that capability; `LspClient` is the client side, which is
//! handed a transport once the backend is ready.

use std::fmt;
use std::sync::Arc;

/// Callback that consumes one inbound message.
///
/// Cloning shares the underlying callback, and clones compare equal to each
/// other. Two handlers built from separate `new` calls never compare equal,
/// even when wrapping the same function.
#[derive(Clone)]
pub struct MessageHandler(Arc<dyn Fn(&str) + Send + Sync>);

impl MessageHandler {
    pub fn new(handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Invoke the handler with one message.
    #[inline]
    pub fn call(&self, message: &str) {
        (self.0)(message)
    }

    /// Whether `self` and `other` share the same callback allocation.
    pub fn same_as(&self, other: &MessageHandler) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for MessageHandler {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for MessageHandler {}

impl fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageHandler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Message carrier expected by the language client.
pub trait Transport: Send + Sync {
    /// Hand one outbound message to the carrier. Never blocks, never fails.
    fn send(&self, message: String);

    /// Register a handler for every inbound message.
    fn subscribe(&self, handler: MessageHandler);

    /// Remove every registration of `handler`.
    fn unsubscribe(&self, handler: &MessageHandler);
}

/// Language client that drives request/response traffic over a transport.
pub trait LspClient: Send + Sync + 'static {
    /// Start using `transport`. Called once, after the backend signalled readiness.
    fn connect(&self, transport: Arc<dyn Transport>);
}
