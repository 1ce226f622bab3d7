//! The one application-level message the bridge produces itself.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Custom method telling the backend which database connection the editor uses.
pub const CONNECTION_SELECTED_METHOD: &str = "pgpad/connectionSelected";

const JSONRPC_VERSION: &str = "2.0";

/// Wire shape of the connection-selected message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSelected {
    pub jsonrpc: String,
    pub id: i64,
    pub method: String,
    pub params: String,
}

impl ConnectionSelected {
    pub fn new(id: i64, connection_id: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: CONNECTION_SELECTED_METHOD.to_string(),
            params: connection_id.into(),
        }
    }
}

/// Time-derived message ids.
///
/// Ids are Unix-epoch milliseconds, bumped when needed so each id is strictly
/// greater than the previous one from the same source.
#[derive(Debug, Default)]
pub(crate) struct TimestampIds {
    last: AtomicI64,
}

impl TimestampIds {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next(&self) -> i64 {
        let now = now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
