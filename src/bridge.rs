//! Event-bus transport bridge.
//!
//! `EventBridge` lets a language client that speaks "send a string / get
//! strings pushed to me" run on top of a host event bus that only knows
//! named, asynchronous, fire-and-forget events.
//!
//! # Channels
//!
//! - request channel: every `send` is emitted here, in call order
//! - response channel: every event received here is relayed to all handlers
//! - ready channel: one-shot signal that the backend is listening; the
//!   bridge then connects the client with itself as the transport
//!
//! # Lifecycle
//!
//! Construction never fails and never blocks. Listener registration runs in
//! a background task; its failure leaves the bridge `Degraded` (sends are
//! still attempted, nothing arrives). `dispose()` releases the listeners and
//! is idempotent. See [`BridgeState`] for the full state machine.

mod failure;
mod handlers;
mod notification;
mod outbound;
mod ready_gate;
mod state;
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::{Arc, Mutex, Weak};

use log::{debug, info, warn};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::bus::{Event, EventBus, EventCallback, Subscription};
use crate::config::BridgeSettings;
use crate::error::{BridgeError, BridgeResult};
use crate::transport::{LspClient, MessageHandler, Transport};

pub use failure::{BridgeFailure, FailureSink, LogSink};
pub use notification::{CONNECTION_SELECTED_METHOD, ConnectionSelected};
pub use state::BridgeState;

use handlers::HandlerList;
use notification::TimestampIds;
use outbound::OutboundQueue;
use ready_gate::ReadyGate;

const LOG_TARGET: &str = "lsp_event_bridge::bridge";

/// Transport that relays a language client's messages over an event bus.
pub struct EventBridge<B: EventBus> {
    bus: Arc<B>,
    settings: BridgeSettings,
    /// Client to connect on the ready signal; taken when connected.
    client: Mutex<Option<Arc<dyn LspClient>>>,
    handlers: HandlerList,
    response_subscription: Mutex<Option<Subscription>>,
    ready_subscription: Mutex<Option<Subscription>>,
    ready_gate: ReadyGate,
    state: Mutex<BridgeState>,
    outbound: OutboundQueue,
    ids: TimestampIds,
    sink: Arc<dyn FailureSink>,
    /// Cancels listener registration still in flight at dispose time.
    setup_cancel: CancellationToken,
    weak_self: Weak<Self>,
}

impl<B: EventBus> EventBridge<B> {
    /// Create a bridge with default settings that logs absorbed failures.
    pub fn new(bus: Arc<B>, client: Arc<dyn LspClient>) -> Arc<Self> {
        Self::with_options(bus, client, BridgeSettings::default(), Arc::new(LogSink))
    }

    /// Create a bridge with explicit settings and failure sink.
    ///
    /// Returns immediately; listener registration continues in the background
    /// on the current Tokio runtime. Without a runtime the bridge starts out
    /// `Degraded` and the failure is reported to `sink`.
    pub fn with_options(
        bus: Arc<B>,
        client: Arc<dyn LspClient>,
        settings: BridgeSettings,
        sink: Arc<dyn FailureSink>,
    ) -> Arc<Self> {
        let runtime = Handle::try_current().ok();

        let bridge = Arc::new_cyclic(|weak_self| {
            let outbound = OutboundQueue::start(
                runtime.as_ref(),
                Arc::clone(&bus),
                settings.channels.request.clone(),
                Arc::clone(&sink),
            );
            Self {
                bus,
                settings,
                client: Mutex::new(Some(client)),
                handlers: HandlerList::new(),
                response_subscription: Mutex::new(None),
                ready_subscription: Mutex::new(None),
                ready_gate: ReadyGate::new(),
                state: Mutex::new(BridgeState::SubscribingToChannels),
                outbound,
                ids: TimestampIds::new(),
                sink,
                setup_cancel: CancellationToken::new(),
                weak_self: weak_self.clone(),
            }
        });

        info!(
            target: LOG_TARGET,
            "Event bridge initialized (request: {}, response: {}, ready: {})",
            bridge.settings.channels.request,
            bridge.settings.channels.response,
            bridge.settings.channels.ready
        );

        match runtime {
            Some(handle) => {
                handle.spawn(initialize_listeners(Arc::downgrade(&bridge)));
            }
            None => bridge.enter_degraded(BridgeError::NoRuntime),
        }

        bridge
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        *self.lock_state()
    }

    /// Number of registered handler entries (duplicates counted).
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Settings this bridge was built with.
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Release both bus subscriptions.
    ///
    /// Idempotent. Handlers stay registered; sends are still attempted.
    pub fn dispose(&self) {
        self.setup_cancel.cancel();

        let first = {
            let mut state = self.lock_state();
            let first = *state != BridgeState::Disposed;
            *state = BridgeState::Disposed;
            first
        };

        let released_response = release_slot(&self.response_subscription);
        let released_ready = release_slot(&self.ready_subscription);

        if first {
            info!(
                target: LOG_TARGET,
                "Event bridge disposed (released response: {}, ready: {})",
                released_response,
                released_ready
            );
        }
    }

    /// Tell the backend which connection the editor selected.
    ///
    /// Emits a `pgpad/connectionSelected` JSON-RPC message on the request
    /// channel, ordered after every earlier `send`, and resolves once the bus
    /// accepted it. Failures are reported to the sink, not returned.
    pub async fn update_selected_connection(&self, connection_id: &str) {
        let message = ConnectionSelected::new(self.ids.next(), connection_id);
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                self.sink.report(BridgeFailure::Emit(e.into()));
                return;
            }
        };

        debug!(
            target: LOG_TARGET,
            "Selecting connection {} (id {})",
            connection_id,
            message.id
        );

        match self.outbound.enqueue_awaited(payload) {
            Ok(done) => {
                // Writer dropped only if the runtime shut down under us
                let _ = done.await;
            }
            Err(e) => self.sink.report(BridgeFailure::Emit(e)),
        }
    }

    /// Register both listeners. Runs once, from the setup task.
    async fn subscribe_channels(&self) -> BridgeResult<()> {
        let response = self
            .bus
            .listen(&self.settings.channels.response, self.response_callback())
            .await?;
        self.install(&self.response_subscription, response);

        let ready = match self
            .bus
            .once(&self.settings.channels.ready, self.ready_callback())
            .await
        {
            Ok(ready) => ready,
            Err(e) => {
                // Degraded means nothing inbound arrives, so drop the half that worked.
                release_slot(&self.response_subscription);
                return Err(e);
            }
        };
        self.install(&self.ready_subscription, ready);

        Ok(())
    }

    fn response_callback(&self) -> EventCallback {
        let weak = self.weak_self.clone();
        Arc::new(move |event: Event| {
            if let Some(bridge) = weak.upgrade() {
                bridge.deliver(event.payload);
            }
        })
    }

    fn ready_callback(&self) -> EventCallback {
        let weak = self.weak_self.clone();
        Arc::new(move |_event: Event| {
            if let Some(bridge) = weak.upgrade() {
                bridge.on_ready();
            }
        })
    }

    /// Store a fresh subscription, or release it at once if already disposed.
    fn install(&self, slot: &Mutex<Option<Subscription>>, mut subscription: Subscription) {
        // Held across the store so dispose cannot slip in between check and store.
        let state = self.lock_state();
        if state.is_terminal() {
            debug!(
                target: LOG_TARGET,
                "Disposed during setup, releasing {} listener",
                subscription.channel()
            );
            subscription.release();
            return;
        }
        *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(subscription);
    }

    /// Relay one inbound payload to every registered handler.
    fn deliver(&self, payload: Value) {
        if !self.state().accepts_inbound() {
            debug!(target: LOG_TARGET, "Bridge not accepting inbound messages, dropping");
            return;
        }

        let message = match payload {
            Value::String(message) => message,
            other => other.to_string(),
        };
        debug!(target: LOG_TARGET, "Received message: {}", message);

        if self.handlers.dispatch(&message) == 0 {
            debug!(target: LOG_TARGET, "No handlers registered, message dropped");
        }
    }

    /// Handshake: connect the client once the backend is listening.
    fn on_ready(&self) {
        if !self.ready_gate.open() {
            warn!(target: LOG_TARGET, "Duplicate ready signal ignored");
            return;
        }

        {
            let mut state = self.lock_state();
            if state.is_terminal() {
                debug!(target: LOG_TARGET, "Ready signal after dispose, not connecting");
                return;
            }
            *state = BridgeState::Connected;
        }

        let client = self
            .client
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let (Some(client), Some(transport)) = (client, self.weak_self.upgrade()) else {
            return;
        };

        info!(target: LOG_TARGET, "Backend ready, connecting client");
        client.connect(transport);
    }

    fn finish_setup(&self, result: BridgeResult<()>) {
        match result {
            Ok(()) => {
                let mut state = self.lock_state();
                // Ready may already have fired, or dispose may have run.
                if *state == BridgeState::SubscribingToChannels {
                    *state = BridgeState::AwaitingReady;
                }
                debug!(target: LOG_TARGET, "Event listeners initialized");
            }
            Err(e) => self.enter_degraded(e),
        }
    }

    fn enter_degraded(&self, error: BridgeError) {
        {
            let mut state = self.lock_state();
            if !state.is_terminal() {
                *state = BridgeState::Degraded;
            }
        }
        self.sink.report(BridgeFailure::Setup(error));
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<B: EventBus> Transport for EventBridge<B> {
    fn send(&self, message: String) {
        debug!(target: LOG_TARGET, "Sending message: {}", message);
        if let Err(e) = self.outbound.enqueue(message) {
            self.sink.report(BridgeFailure::Emit(e));
        }
    }

    fn subscribe(&self, handler: MessageHandler) {
        self.handlers.push(handler);
    }

    fn unsubscribe(&self, handler: &MessageHandler) {
        let removed = self.handlers.remove(handler);
        debug!(target: LOG_TARGET, "Unsubscribed {} handler entries", removed);
    }
}

impl<B: EventBus> std::fmt::Debug for EventBridge<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("state", &self.state())
            .field("channels", &self.settings.channels)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Background setup: register listeners unless dispose gets there first.
async fn initialize_listeners<B: EventBus>(bridge: Weak<EventBridge<B>>) {
    let Some(bridge) = bridge.upgrade() else {
        return;
    };
    let cancel = bridge.setup_cancel.clone();

    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            debug!(target: LOG_TARGET, "Listener setup cancelled by dispose");
        }
        result = bridge.subscribe_channels() => {
            bridge.finish_setup(result);
        }
    }
}

/// Release and clear a subscription slot. Returns whether anything was released.
fn release_slot(slot: &Mutex<Option<Subscription>>) -> bool {
    let subscription = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    match subscription {
        Some(mut subscription) => subscription.release(),
        None => false,
    }
}
