//! Common test utilities for bridge integration tests.
//!
//! The helpers stand up the two things every bridge test needs: a mock
//! board with its control handle, and a loopback [`Sink`] that plays the
//! telemetry receiver.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use hatlink_bridge::{DispatchOutcome, Publisher, RestartError, Restarter};
use hatlink_core::{BridgeConfig, Destination, HostId};
use hatlink_hardware::AnyBoard;
use hatlink_hardware::mock::{MockBoard, MockBoardHandle};
use hatlink_network::{FailoverSender, OscListener, SenderConfig};
use hatlink_protocol::{AddressBook, OscMessage};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const HOST: &str = "test-hat";

/// A destination nothing can send to (limited broadcast without SO_BROADCAST).
pub fn unreachable() -> Destination {
    Destination::new("255.255.255.255", 8000)
}

/// Loopback telemetry receiver.
pub struct Sink {
    listener: OscListener,
}

impl Sink {
    pub async fn bind() -> Self {
        Self {
            listener: OscListener::bind("127.0.0.1:0".parse().unwrap())
                .await
                .unwrap(),
        }
    }

    pub fn destination(&self) -> Destination {
        let addr = self.listener.local_addr();
        Destination::new(addr.ip().to_string(), addr.port())
    }

    /// Next message, or `None` if nothing arrives within `wait`.
    pub async fn next(&mut self, wait: Duration) -> Option<OscMessage> {
        match tokio::time::timeout(wait, self.listener.recv()).await {
            Ok(Ok((packet, _))) => packet.into_messages().into_iter().next(),
            _ => None,
        }
    }

    /// Skip messages until one with `address` arrives.
    pub async fn next_at(&mut self, address: &str, wait: Duration) -> Option<OscMessage> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let message = self.next(remaining).await?;
            if message.address == address {
                return Some(message);
            }
        }
    }

    /// Everything that arrives until the socket is quiet for `quiet`.
    pub async fn drain(&mut self, quiet: Duration) -> Vec<OscMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.next(quiet).await {
            messages.push(message);
        }
        messages
    }
}

pub fn addresses() -> Arc<AddressBook> {
    Arc::new(AddressBook::new(&HostId::new(HOST).unwrap()))
}

pub fn mock_board() -> (Arc<AnyBoard>, MockBoardHandle) {
    let (board, handle) = MockBoard::new();
    (Arc::new(AnyBoard::Mock(board)), handle)
}

pub async fn publisher(
    board: &Arc<AnyBoard>,
    primary: Destination,
    backup: Destination,
) -> Arc<Publisher> {
    let sender = FailoverSender::connect(&SenderConfig {
        primary,
        backup,
        timeout: Duration::from_millis(200),
    })
    .await
    .unwrap();
    Arc::new(Publisher::new(sender, Arc::clone(board)))
}

/// Bridge configuration for loopback tests: ephemeral listen port, fast
/// polling, heartbeat far enough out not to interfere.
pub fn config(primary: Destination, backup: Destination) -> BridgeConfig {
    BridgeConfig {
        listen_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        listen_port: 0,
        primary_host: primary.host,
        backup_host: backup.host,
        destination_port: primary.port,
        host_id: HostId::new(HOST).unwrap(),
        heartbeat_interval: Duration::from_secs(60),
        poll_interval: Duration::from_millis(20),
        shutdown_timeout: Duration::from_secs(2),
        ..BridgeConfig::default()
    }
}

/// Restarter that counts calls instead of rebooting.
#[derive(Debug, Clone, Default)]
pub struct CountingRestart {
    calls: Arc<AtomicUsize>,
}

impl CountingRestart {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Restarter for CountingRestart {
    async fn restart(&self) -> Result<(), RestartError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll `condition` every 10ms until it holds or `wait` passes.
pub async fn eventually(wait: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + wait;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

pub fn is_rejected(outcome: &DispatchOutcome) -> bool {
    matches!(outcome, DispatchOutcome::Rejected(_))
}
