use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tokio::sync::oneshot;

use lsp_event_bridge::config::{ChannelNames, load_user_settings};
use lsp_event_bridge::{
    BridgeResult, BridgeSettings, BridgeState, Event, EventBridge, EventBus, EventCallback,
    LocalEventBus, LogSink, LspClient, MessageHandler, Subscription, Transport,
};

/// Relay JSON-RPC lines from stdin to a loopback backend over an in-process event bus
#[derive(Parser)]
#[command(name = "lsp-event-bridge")]
#[command(version)]
#[command(about = "Relay JSON-RPC lines from stdin to a loopback backend over an in-process event bus")]
struct Cli {
    /// Bridge config file (default: user config, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Send a connection-selected notification right after the handshake
    #[arg(long)]
    connection: Option<String>,

    /// Log filter used when RUST_LOG is not set (e.g. debug, lsp_event_bridge=trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Client that prints every inbound message and hands its transport to `main`.
struct StdoutClient {
    connected: Mutex<Option<oneshot::Sender<Arc<dyn Transport>>>>,
}

impl LspClient for StdoutClient {
    fn connect(&self, transport: Arc<dyn Transport>) {
        transport.subscribe(MessageHandler::new(|message| println!("{}", message)));
        if let Some(tx) = self.connected.lock().unwrap_or_else(|e| e.into_inner()).take() {
            let _ = tx.send(transport);
        }
    }
}

/// Backend stand-in: answers every request carrying an `id` with a null result.
struct LoopbackBackend {
    bus: Arc<LocalEventBus>,
    ready_channel: String,
    _requests: Subscription,
}

impl LoopbackBackend {
    async fn start(bus: &Arc<LocalEventBus>, channels: &ChannelNames) -> BridgeResult<Self> {
        let responder = Arc::clone(bus);
        let response_channel = channels.response.clone();
        let on_request: EventCallback = Arc::new(move |event: Event| {
            let Some(response) = loopback_response(&event.payload) else {
                return;
            };
            let bus = Arc::clone(&responder);
            let channel = response_channel.clone();
            tokio::spawn(async move {
                if let Err(e) = bus.emit(&channel, Value::String(response)).await {
                    log::warn!(target: "lsp_event_bridge::loopback", "Failed to respond: {}", e);
                }
            });
        });

        let requests = bus.listen(&channels.request, on_request).await?;
        Ok(Self {
            bus: Arc::clone(bus),
            ready_channel: channels.ready.clone(),
            _requests: requests,
        })
    }

    async fn signal_ready(&self) -> BridgeResult<()> {
        self.bus.emit(&self.ready_channel, Value::Null).await
    }
}

fn loopback_response(payload: &Value) -> Option<String> {
    let request: Value = match payload {
        Value::String(text) => serde_json::from_str(text).ok()?,
        other => other.clone(),
    };
    request.get("method")?;
    let id = request.get("id")?;
    Some(json!({"jsonrpc": "2.0", "id": id, "result": null}).to_string())
}

fn load_settings(path: Option<&Path>) -> BridgeResult<BridgeSettings> {
    match path {
        Some(path) => BridgeSettings::load(path),
        None => Ok(load_user_settings()?.unwrap_or_default()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str()))
        .format_timestamp_millis()
        .init();

    let settings = load_settings(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let bus = Arc::new(LocalEventBus::new());
    let backend = LoopbackBackend::start(&bus, &settings.channels)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let (connected_tx, connected_rx) = oneshot::channel();
    let client = Arc::new(StdoutClient {
        connected: Mutex::new(Some(connected_tx)),
    });
    let bridge = EventBridge::with_options(Arc::clone(&bus), client, settings, Arc::new(LogSink));

    // The ready signal is one-shot: only fire it once the bridge listens for it.
    while bridge.state() == BridgeState::SubscribingToChannels {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    if bridge.state() == BridgeState::Degraded {
        eprintln!("Error: bridge failed to subscribe to its channels");
        std::process::exit(1);
    }
    if let Err(e) = backend.signal_ready().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let Ok(transport) = connected_rx.await else {
        eprintln!("Error: client was never connected");
        std::process::exit(1);
    };

    if let Some(connection_id) = cli.connection {
        bridge.update_selected_connection(&connection_id).await;
    }

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => transport.send(line),
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    // Let in-flight responses reach stdout before tearing down.
    tokio::time::sleep(Duration::from_millis(100)).await;
    bridge.dispose();
}
