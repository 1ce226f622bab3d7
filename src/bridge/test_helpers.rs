//! Shared test utilities for bridge module tests.
//!
//! Import from submodule tests via `use crate::bridge::test_helpers::*;`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use super::failure::{BridgeFailure, FailureSink};
use crate::bus::{Event, EventBus, EventCallback, LocalEventBus, Subscription};
use crate::error::{BridgeError, BridgeResult};
use crate::transport::{LspClient, Transport};

/// Poll `condition` until it holds, panicking after two seconds.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Give queued bus deliveries a chance to run.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

/// Render a payload the way the bridge forwards it.
pub(crate) fn payload_text(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Record every payload published on `channel`.
pub(crate) async fn record_channel(
    bus: &LocalEventBus,
    channel: &str,
) -> (Subscription, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: EventCallback = Arc::new(move |event: Event| {
        sink.lock().unwrap().push(payload_text(event.payload));
    });
    let subscription = bus
        .listen(channel, callback)
        .await
        .expect("local bus listen never fails");
    (subscription, seen)
}

/// Failure sink that keeps everything it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    failures: Mutex<Vec<BridgeFailure>>,
}

impl RecordingSink {
    pub(crate) fn setup_failures(&self) -> usize {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .filter(|f| matches!(f, BridgeFailure::Setup(_)))
            .count()
    }

    pub(crate) fn emit_failures(&self) -> usize {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .filter(|f| matches!(f, BridgeFailure::Emit(_)))
            .count()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, failure: BridgeFailure) {
        self.failures.lock().unwrap().push(failure);
    }
}

/// Bus on which every operation fails.
#[derive(Debug, Default)]
pub(crate) struct FailingBus;

impl FailingBus {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl EventBus for FailingBus {
    async fn listen(&self, channel: &str, _callback: EventCallback) -> BridgeResult<Subscription> {
        Err(BridgeError::subscribe(channel, "bus unavailable"))
    }

    async fn once(&self, channel: &str, _callback: EventCallback) -> BridgeResult<Subscription> {
        Err(BridgeError::subscribe(channel, "bus unavailable"))
    }

    async fn emit(&self, channel: &str, _payload: Value) -> BridgeResult<()> {
        Err(BridgeError::emit(channel, "bus unavailable"))
    }
}

/// Local bus whose `listen` and/or `once` can be made to fail.
pub(crate) struct FlakyBus {
    pub(crate) inner: LocalEventBus,
    pub(crate) fail_listen: bool,
    pub(crate) fail_once: bool,
}

impl EventBus for FlakyBus {
    async fn listen(&self, channel: &str, callback: EventCallback) -> BridgeResult<Subscription> {
        if self.fail_listen {
            return Err(BridgeError::subscribe(channel, "listen rejected"));
        }
        self.inner.listen(channel, callback).await
    }

    async fn once(&self, channel: &str, callback: EventCallback) -> BridgeResult<Subscription> {
        if self.fail_once {
            return Err(BridgeError::subscribe(channel, "once rejected"));
        }
        self.inner.once(channel, callback).await
    }

    async fn emit(&self, channel: &str, payload: Value) -> BridgeResult<()> {
        self.inner.emit(channel, payload).await
    }
}

/// Client that records every `connect` call.
#[derive(Default)]
pub(crate) struct RecordingClient {
    transports: Mutex<Vec<Arc<dyn Transport>>>,
}

impl RecordingClient {
    pub(crate) fn connect_count(&self) -> usize {
        self.transports.lock().unwrap().len()
    }

    pub(crate) fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transports.lock().unwrap().first().cloned()
    }
}

impl LspClient for RecordingClient {
    fn connect(&self, transport: Arc<dyn Transport>) {
        self.transports.lock().unwrap().push(transport);
    }
}
