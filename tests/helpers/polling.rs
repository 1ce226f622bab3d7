//! Polling utilities for asynchronous bus delivery.

// Shared across test binaries; not every binary uses every function.
#![allow(dead_code)]

use std::time::Duration;

/// Poll `condition` every 5ms until it holds, panicking after two seconds.
pub async fn wait_until(description: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {}",
            description
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Give queued bus deliveries a chance to run before asserting a negative.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
