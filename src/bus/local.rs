//! In-process event bus.
//!
//! `LocalEventBus` stands in for the host application's event system when the
//! bridge and the backend live in the same process (tests, the demo binary,
//! embedding hosts without their own bus).
//!
//! # Architecture
//!
//! - `emit()` pushes onto an unbounded queue and returns immediately
//! - a single dispatcher task pops events in publish order and delivers each
//!   one to a snapshot of the channel's listeners
//! - `once` listeners are removed from the table before they are invoked, so
//!   they fire at most once even if events are queued back to back

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, trace};
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Event, EventBus, EventCallback, Subscription};
use crate::error::{BridgeError, BridgeResult};

struct Listener {
    id: u64,
    once: bool,
    callback: EventCallback,
}

struct BusInner {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    next_id: AtomicU64,
    queue: mpsc::UnboundedSender<Event>,
}

/// Cheaply cloneable handle to an in-process event bus.
///
/// The dispatcher task stops once every handle is dropped.
#[derive(Clone)]
pub struct LocalEventBus {
    inner: Arc<BusInner>,
}

impl LocalEventBus {
    /// Create a bus and spawn its dispatcher task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new() -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(BusInner {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            queue,
        });

        tokio::spawn(dispatch_loop(Arc::downgrade(&inner), rx));

        Self { inner }
    }

    /// Number of listeners currently registered on `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        let listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        listeners.get(channel).map_or(0, Vec::len)
    }

    fn register(&self, channel: &str, callback: EventCallback, once: bool) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut listeners = self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            listeners.entry(channel.to_string()).or_default().push(Listener {
                id,
                once,
                callback,
            });
        }

        debug!(
            target: "lsp_event_bridge::bus",
            "Registered {} listener {} on {}",
            if once { "one-shot" } else { "persistent" },
            id,
            channel
        );

        let weak = Arc::downgrade(&self.inner);
        let owned_channel = channel.to_string();
        Subscription::new(channel, move || {
            if let Some(inner) = weak.upgrade() {
                remove_listener(&inner, &owned_channel, id);
            }
        })
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(channel, entries)| (channel.as_str(), entries.len()))
            .collect();
        f.debug_struct("LocalEventBus")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventBus for LocalEventBus {
    async fn listen(&self, channel: &str, callback: EventCallback) -> BridgeResult<Subscription> {
        Ok(self.register(channel, callback, false))
    }

    async fn once(&self, channel: &str, callback: EventCallback) -> BridgeResult<Subscription> {
        Ok(self.register(channel, callback, true))
    }

    async fn emit(&self, channel: &str, payload: Value) -> BridgeResult<()> {
        self.inner
            .queue
            .send(Event {
                channel: channel.to_string(),
                payload,
            })
            .map_err(|_| BridgeError::BusClosed)
    }
}

fn remove_listener(inner: &BusInner, channel: &str, id: u64) {
    let mut listeners = inner.listeners.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(entries) = listeners.get_mut(channel) {
        entries.retain(|listener| listener.id != id);
        if entries.is_empty() {
            listeners.remove(channel);
        }
    }
}

/// Pop events in publish order and deliver them one at a time.
async fn dispatch_loop(inner: Weak<BusInner>, mut rx: mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        dispatch(&inner, event);
    }
    debug!(target: "lsp_event_bridge::bus", "Dispatcher stopped");
}

fn dispatch(inner: &BusInner, event: Event) {
    // Snapshot under the lock, invoke without it: listeners may re-enter the bus.
    let callbacks: Vec<EventCallback> = {
        let mut listeners = inner.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entries) = listeners.get_mut(&event.channel) else {
            trace!(
                target: "lsp_event_bridge::bus",
                "No listeners on {}, dropping event",
                event.channel
            );
            return;
        };
        let callbacks: Vec<EventCallback> = entries
            .iter()
            .map(|listener| Arc::clone(&listener.callback))
            .collect();
        entries.retain(|listener| !listener.once);
        if entries.is_empty() {
            listeners.remove(&event.channel);
        }
        callbacks
    };

    for callback in callbacks {
        callback(event.clone());
    }
}
