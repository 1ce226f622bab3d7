//! Host event bus abstraction.
//!
//! The host application exposes named, asynchronous, fire-and-forget
//! channels. `EventBus` captures the three primitives the bridge relies on:
//! persistent listeners, one-shot listeners and emission.
//!
//! Delivery contract assumed by callers:
//! - events on one channel are delivered in publish order
//! - a `once` listener is removed by the bus after its first delivery
//! - listeners run outside of any bus-internal lock, so they may emit or
//!   release subscriptions re-entrantly

mod local;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::BridgeResult;

pub use local::LocalEventBus;

/// A single event delivered on a named channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub channel: String,
    pub payload: Value,
}

/// Listener invoked for every event on a channel.
pub type EventCallback = Arc<dyn Fn(Event) + Send + Sync>;

/// Publish/subscribe primitive provided by the host application.
pub trait EventBus: Send + Sync + 'static {
    /// Register a persistent listener on `channel`.
    fn listen(
        &self,
        channel: &str,
        callback: EventCallback,
    ) -> impl Future<Output = BridgeResult<Subscription>> + Send;

    /// Register a listener that the bus removes after its first delivery.
    fn once(
        &self,
        channel: &str,
        callback: EventCallback,
    ) -> impl Future<Output = BridgeResult<Subscription>> + Send;

    /// Publish `payload` on `channel`.
    ///
    /// Resolves once the bus has accepted the event, not when listeners ran.
    fn emit(&self, channel: &str, payload: Value) -> impl Future<Output = BridgeResult<()>> + Send;
}

/// Live registration of one listener on one channel.
///
/// The first `release()` unregisters the listener; later calls are no-ops.
/// Dropping an active subscription releases it.
pub struct Subscription {
    channel: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription whose release runs `release` exactly once.
    pub fn new(channel: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            channel: channel.into(),
            release: Some(Box::new(release)),
        }
    }

    /// Channel this subscription listens on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the listener is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Unregister the listener.
    ///
    /// Returns `true` if this call released it, `false` if it was already released.
    pub fn release(&mut self) -> bool {
        match self.release.take() {
            Some(release) => {
                release();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
