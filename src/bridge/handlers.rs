//! Ordered list of inbound message handlers.
//!
//! Dispatch iterates a snapshot taken under the lock, so a handler that
//! unsubscribes itself (or registers another handler) mid-dispatch neither
//! deadlocks nor disturbs the pass in progress. The change takes effect from
//! the next message on.

use std::sync::Mutex;

use crate::transport::MessageHandler;

#[derive(Debug, Default)]
pub(crate) struct HandlerList {
    handlers: Mutex<Vec<MessageHandler>>,
}

impl HandlerList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a handler. Duplicates are kept and invoked once per registration.
    pub(crate) fn push(&self, handler: MessageHandler) {
        self.lock().push(handler);
    }

    /// Remove every entry identical to `handler`, returning how many were removed.
    pub(crate) fn remove(&self, handler: &MessageHandler) -> usize {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|registered| !registered.same_as(handler));
        before - handlers.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Deliver `message` to every handler registered at call time, in
    /// registration order. Returns the number of handlers invoked.
    pub(crate) fn dispatch(&self, message: &str) -> usize {
        let snapshot = self.lock().clone();
        for handler in &snapshot {
            handler.call(message);
        }
        snapshot.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MessageHandler>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
