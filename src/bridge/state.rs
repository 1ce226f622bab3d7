//! Lifecycle states of an event bridge.

/// State of an `EventBridge`.
///
/// Tracks the subscription setup and readiness handshake:
/// - SubscribingToChannels: construction returned, listeners being registered
/// - AwaitingReady: both listeners registered, waiting for the ready signal
/// - Connected: ready signal received, client holds the transport
/// - Degraded: listener registration failed; sends are still attempted
/// - Disposed: subscriptions released (terminal state)
///
/// State transitions:
/// - SubscribingToChannels -> AwaitingReady (both subscriptions succeed)
/// - SubscribingToChannels -> Degraded (any subscription fails)
/// - SubscribingToChannels -> Connected (ready fires before setup bookkeeping finishes)
/// - AwaitingReady -> Connected (ready signal)
/// - any -> Disposed (dispose)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Listener registration in progress
    SubscribingToChannels,
    /// Listeners registered, handshake pending
    AwaitingReady,
    /// Handshake complete, relaying in both directions
    Connected,
    /// Listener registration failed; no inbound traffic will arrive
    Degraded,
    /// Subscriptions released (terminal)
    Disposed,
}

impl BridgeState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, BridgeState::Disposed)
    }

    /// Whether inbound messages can still reach handlers in this state.
    pub fn accepts_inbound(self) -> bool {
        matches!(
            self,
            BridgeState::SubscribingToChannels | BridgeState::AwaitingReady | BridgeState::Connected
        )
    }
}
