//! Test doubles for the bus, the client and the failure sink.

// Shared across test binaries; not every binary uses every item.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::Value;

use lsp_event_bridge::{
    BridgeError, BridgeFailure, BridgeResult, BridgeState, Event, EventBridge, EventBus,
    EventCallback, FailureSink, LocalEventBus, LspClient, MessageHandler, Subscription, Transport,
};

use super::polling::wait_until;

/// Record every payload published on `channel`, as the text a handler would see.
pub async fn record_channel(
    bus: &LocalEventBus,
    channel: &str,
) -> (Subscription, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: EventCallback = Arc::new(move |event: Event| {
        let text = match event.payload {
            Value::String(text) => text,
            other => other.to_string(),
        };
        sink.lock().unwrap().push(text);
    });
    let subscription = bus
        .listen(channel, callback)
        .await
        .expect("local bus listen never fails");
    (subscription, seen)
}

/// Handler that appends `label:message` to a shared log.
pub fn labelled_handler(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> MessageHandler {
    let log = Arc::clone(log);
    MessageHandler::new(move |message| {
        log.lock().unwrap().push(format!("{}:{}", label, message));
    })
}

/// Client that records every `connect` call.
#[derive(Default)]
pub struct RecordingClient {
    transports: Mutex<Vec<Arc<dyn Transport>>>,
}

impl RecordingClient {
    pub fn connect_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transports
            .lock()
            .unwrap()
            .first()
            .cloned()
            .expect("client should have been connected")
    }
}

impl LspClient for RecordingClient {
    fn connect(&self, transport: Arc<dyn Transport>) {
        self.transports.lock().unwrap().push(transport);
    }
}

/// Failure sink that keeps the rendered failures.
#[derive(Default)]
pub struct RecordingSink {
    setup: Mutex<Vec<String>>,
    emit: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn setup_failures(&self) -> Vec<String> {
        self.setup.lock().unwrap().clone()
    }

    pub fn emit_failures(&self) -> Vec<String> {
        self.emit.lock().unwrap().clone()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, failure: BridgeFailure) {
        match &failure {
            BridgeFailure::Setup(_) => self.setup.lock().unwrap().push(failure.to_string()),
            BridgeFailure::Emit(_) => self.emit.lock().unwrap().push(failure.to_string()),
        }
    }
}

/// Bus that refuses every listener but emits through a working local bus.
pub struct SubscribeRefusingBus {
    pub inner: LocalEventBus,
}

impl EventBus for SubscribeRefusingBus {
    async fn listen(&self, channel: &str, _callback: EventCallback) -> BridgeResult<Subscription> {
        Err(BridgeError::subscribe(channel, "bus unavailable"))
    }

    async fn once(&self, channel: &str, _callback: EventCallback) -> BridgeResult<Subscription> {
        Err(BridgeError::subscribe(channel, "bus unavailable"))
    }

    async fn emit(&self, channel: &str, payload: Value) -> BridgeResult<()> {
        self.inner.emit(channel, payload).await
    }
}

/// Bus that accepts listeners but rejects every emission.
pub struct EmitRejectingBus {
    pub inner: LocalEventBus,
}

impl EventBus for EmitRejectingBus {
    async fn listen(&self, channel: &str, callback: EventCallback) -> BridgeResult<Subscription> {
        self.inner.listen(channel, callback).await
    }

    async fn once(&self, channel: &str, callback: EventCallback) -> BridgeResult<Subscription> {
        self.inner.once(channel, callback).await
    }

    async fn emit(&self, channel: &str, _payload: Value) -> BridgeResult<()> {
        Err(BridgeError::emit(channel, "rejected by host"))
    }
}

/// Build a bridge on `bus` and wait until it listens for the ready signal.
pub async fn awaiting_bridge(
    bus: &Arc<LocalEventBus>,
) -> (Arc<EventBridge<LocalEventBus>>, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::default());
    let bridge = EventBridge::new(Arc::clone(bus), client.clone());
    wait_until("bridge awaiting ready", || {
        bridge.state() == BridgeState::AwaitingReady
    })
    .await;
    (bridge, client)
}

/// Build a bridge, fire the ready signal and wait for the client to connect.
pub async fn connected_bridge(
    bus: &Arc<LocalEventBus>,
) -> (Arc<EventBridge<LocalEventBus>>, Arc<RecordingClient>) {
    let (bridge, client) = awaiting_bridge(bus).await;
    bus.emit("lsp-initialized", Value::Null)
        .await
        .expect("local bus emit");
    wait_until("client connected", || client.connect_count() == 1).await;
    (bridge, client)
}
