//! Pieces shared by the polling loops.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What one polling cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Channels whose value changed and were published.
    pub changes: usize,
    /// Publishes (changes and heartbeat) that reached a destination.
    pub delivered: usize,
    /// Channels that could not be read this cycle.
    pub read_errors: usize,
    /// Whether a heartbeat was published.
    pub heartbeat: bool,
}

/// Sleep for `interval` unless cancelled first.
///
/// Returns `false` once the token is cancelled, so loops read as
/// `while wait_next_cycle(..).await`.
pub(crate) async fn wait_next_cycle(token: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}
