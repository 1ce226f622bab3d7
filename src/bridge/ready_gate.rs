//! One-shot gate for the backend readiness signal.
//!
//! The host bus promises that the ready channel fires once; the gate makes
//! that locally checkable so the client is connected at most once no matter
//! how often the signal is delivered.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub(crate) struct ReadyGate {
    opened: AtomicBool,
}

impl ReadyGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open the gate. Returns `true` only for the call that opened it.
    pub(crate) fn open(&self) -> bool {
        !self.opened.swap(true, Ordering::AcqRel)
    }
}
