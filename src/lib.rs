//! Message bridge between an editor's language client and a backend language
//! server reachable only through a host application's event bus.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lsp_event_bridge::{EventBridge, LocalEventBus, LspClient, Transport};
//!
//! struct Client;
//!
//! impl LspClient for Client {
//!     fn connect(&self, transport: Arc<dyn Transport>) {
//!         transport.send(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#.into());
//!     }
//! }
//!
//! # async fn run() {
//! let bus = Arc::new(LocalEventBus::new());
//! let bridge = EventBridge::new(bus, Arc::new(Client));
//! // ... backend emits "lsp-initialized", the client gets connected ...
//! bridge.dispose();
//! # }
//! ```

pub mod bridge;
pub mod bus;
pub mod config;
pub mod error;
pub mod transport;

pub use bridge::{BridgeFailure, BridgeState, EventBridge, FailureSink, LogSink};
pub use bus::{Event, EventBus, EventCallback, LocalEventBus, Subscription};
pub use config::BridgeSettings;
pub use error::{BridgeError, BridgeResult};
pub use transport::{LspClient, MessageHandler, Transport};
