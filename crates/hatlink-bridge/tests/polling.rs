//! Integration tests for the analog poller and input monitor
//!
//! Cycles are stepped by hand so every assertion is about a known number of
//! samples. The input monitor is given explicit cycle times, which makes the
//! heartbeat cadence exact without sleeping.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Sink, addresses, mock_board, publisher, unreachable};
use hatlink_bridge::{AnalogPoller, InputMonitor};
use hatlink_core::{ChangePolicy, Light};
use hatlink_hardware::{Actuator, IoBackend};
use hatlink_protocol::{OscArg, OscMessage};
use rstest::rstest;
use tokio::time::Instant;

const QUIET: Duration = Duration::from_millis(150);
const POLL: Duration = Duration::from_millis(100);

/// Sends happen on change only, never on every poll
#[tokio::test]
async fn test_analog_sends_only_on_change() {
    let mut sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut poller = AnalogPoller::new(board, publisher, addresses(), ChangePolicy::Exact, POLL);

    let readings = [0.0f32, 1.25, 1.25, 1.25, 1.26, 1.26, 0.0];
    let mut changes = Vec::new();
    for value in readings {
        handle.set_analog(0, value);
        changes.push(poller.poll_cycle().await.changes);
    }

    assert_eq!(changes, vec![0, 1, 0, 0, 1, 0, 1]);
    assert_eq!(
        sink.drain(QUIET).await,
        vec![
            OscMessage::with_arg("/test-hat/A1", OscArg::Float(1.25)),
            OscMessage::with_arg("/test-hat/A1", OscArg::Float(1.26)),
            OscMessage::with_arg("/test-hat/A1", OscArg::Float(0.0)),
        ]
    );
}

/// Channels are numbered from 1 on the wire
#[tokio::test]
async fn test_analog_addresses_every_channel() {
    let mut sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut poller = AnalogPoller::new(board, publisher, addresses(), ChangePolicy::Exact, POLL);

    handle.set_analog(0, 1.0);
    handle.set_analog(1, 2.0);
    handle.set_analog(2, 3.0);
    let report = poller.poll_cycle().await;

    assert_eq!(report.changes, 3);
    assert_eq!(report.delivered, 3);
    let addresses: Vec<String> = sink.drain(QUIET).await.into_iter().map(|m| m.address).collect();
    assert_eq!(addresses, vec!["/test-hat/A1", "/test-hat/A2", "/test-hat/A3"]);
}

/// Under a dead-band, small wobbles are suppressed
#[tokio::test]
async fn test_analog_deadband_policy() {
    let mut sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut poller = AnalogPoller::new(
        board,
        publisher,
        addresses(),
        ChangePolicy::DeadBand(1.0),
        POLL,
    );

    let mut changes = 0;
    for value in [0.5f32, 0.9, 0.2, 2.0, 2.5, 1.5, 0.5] {
        handle.set_analog(1, value);
        changes += poller.poll_cycle().await.changes;
    }

    // 0.0 -> 2.0 and 2.0 -> 0.5 are the only moves larger than 1.0.
    assert_eq!(changes, 2);
    assert_eq!(sink.drain(QUIET).await.len(), 2);
}

/// A failing read leaves the channel untouched and the poller running
#[tokio::test]
async fn test_analog_read_failure_keeps_state() {
    let sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut poller = AnalogPoller::new(board, publisher, addresses(), ChangePolicy::Exact, POLL);

    handle.set_analog(0, 4.0);
    poller.poll_cycle().await;

    handle.fail_reads(true);
    let report = poller.poll_cycle().await;
    assert_eq!(report.read_errors, 3);
    assert_eq!(report.changes, 0);
    assert_eq!(poller.state().get(0), Some(4.0));

    handle.fail_reads(false);
    assert_eq!(poller.poll_cycle().await.changes, 0);
}

/// A NaN sample counts as a failed read under either policy
#[rstest]
#[case(ChangePolicy::Exact)]
#[case(ChangePolicy::DeadBand(0.5))]
#[tokio::test]
async fn test_analog_nan_is_a_read_error(#[case] policy: ChangePolicy) {
    let mut sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut poller = AnalogPoller::new(board, publisher, addresses(), policy, POLL);

    handle.set_analog(2, 3.0);
    assert_eq!(poller.poll_cycle().await.changes, 1);

    handle.set_analog(2, f32::NAN);
    let mut changes = Vec::new();
    for _ in 0..5 {
        let report = poller.poll_cycle().await;
        assert_eq!(report.read_errors, 1);
        changes.push(report.changes);
    }
    assert_eq!(changes, vec![0; 5]);
    assert_eq!(poller.state().get(2), Some(3.0));

    // A finite reading afterwards is compared against the last good value.
    handle.set_analog(2, 0.0);
    assert_eq!(poller.poll_cycle().await.changes, 1);
    assert_eq!(
        sink.drain(QUIET).await,
        vec![
            OscMessage::with_arg("/test-hat/A3", OscArg::Float(3.0)),
            OscMessage::with_arg("/test-hat/A3", OscArg::Float(0.0)),
        ]
    );
}

/// Digital edges are published once per edge
#[tokio::test]
async fn test_digital_edges() {
    let mut sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut monitor =
        InputMonitor::new(board, publisher, addresses(), Duration::from_secs(60), POLL);
    let start = Instant::now();
    monitor.reset_heartbeat(start);

    let levels = [0u8, 1, 1, 0, 0, 1];
    for (k, level) in levels.iter().enumerate() {
        handle.set_digital(2, *level);
        monitor.poll_cycle(start + POLL * k as u32).await;
    }

    assert_eq!(
        sink.drain(QUIET).await,
        vec![
            OscMessage::with_arg("/test-hat/DI3", 1),
            OscMessage::with_arg("/test-hat/DI3", 0),
            OscMessage::with_arg("/test-hat/DI3", 1),
        ]
    );
}

/// heartbeat=2s, poll=0.1s: twenty quiet cycles produce exactly one heartbeat
#[tokio::test]
async fn test_heartbeat_once_per_window() {
    let mut sink = Sink::bind().await;
    let (board, _handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut monitor =
        InputMonitor::new(board, publisher, addresses(), Duration::from_secs(2), POLL);
    let start = Instant::now();
    monitor.reset_heartbeat(start);

    let mut heartbeats = Vec::new();
    for k in 1..=40u32 {
        if monitor.poll_cycle(start + POLL * k).await.heartbeat {
            heartbeats.push(k);
        }
    }

    assert_eq!(heartbeats, vec![20, 40]);
    assert_eq!(
        sink.drain(QUIET).await,
        vec![
            OscMessage::with_arg("/test-hat/heartbeat", 1),
            OscMessage::with_arg("/test-hat/heartbeat", 1),
        ]
    );
}

/// A change at t=1s with a 10s interval moves the heartbeat to t=11s
#[tokio::test]
async fn test_change_delays_heartbeat() {
    let sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut monitor =
        InputMonitor::new(board, publisher, addresses(), Duration::from_secs(10), POLL);
    let start = Instant::now();
    monitor.reset_heartbeat(start);

    let mut first_heartbeat = None;
    for k in 1..=120u32 {
        if k == 10 {
            handle.set_digital(0, 1);
        }
        let report = monitor.poll_cycle(start + POLL * k).await;
        if report.heartbeat {
            first_heartbeat = Some(k);
            break;
        }
    }

    assert_eq!(first_heartbeat, Some(110));
}

/// Heartbeats keep their cadence when nothing is reachable, and warn lights up
#[tokio::test]
async fn test_heartbeat_with_unreachable_destinations() {
    let (board, handle) = mock_board();
    let publisher = publisher(&board, unreachable(), unreachable()).await;
    let mut monitor =
        InputMonitor::new(board, publisher, addresses(), Duration::from_secs(1), POLL);
    let start = Instant::now();
    monitor.reset_heartbeat(start);

    let mut heartbeats = 0;
    for k in 1..=30u32 {
        let report = monitor.poll_cycle(start + POLL * k).await;
        if report.heartbeat {
            heartbeats += 1;
            assert_eq!(report.delivered, 0);
        }
    }

    assert_eq!(heartbeats, 3);
    assert_eq!(handle.light(Light::Warn), 1.0);
    assert_eq!(handle.light(Light::Comms), 0.0);
}

/// A later successful heartbeat clears the warning light again
#[tokio::test]
async fn test_successful_heartbeat_clears_warning() {
    let sink = Sink::bind().await;
    let (board, handle) = mock_board();
    let publisher = publisher(&board, sink.destination(), unreachable()).await;
    let mut monitor = InputMonitor::new(
        Arc::clone(&board),
        publisher,
        addresses(),
        Duration::from_secs(1),
        POLL,
    );
    let start = Instant::now();
    monitor.reset_heartbeat(start);

    board.write(Actuator::Light(Light::Warn), 1.0).await.unwrap();
    assert!(!monitor.poll_cycle(start + Duration::from_millis(500)).await.heartbeat);
    assert_eq!(handle.light(Light::Warn), 1.0);

    let report = monitor.poll_cycle(start + Duration::from_secs(1)).await;
    assert!(report.heartbeat);
    assert_eq!(report.delivered, 1);
    assert_eq!(handle.light(Light::Warn), 0.0);
    assert_eq!(handle.light(Light::Comms), 0.3);
}
