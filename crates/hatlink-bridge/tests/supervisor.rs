//! End-to-end tests for the bridge lifecycle
//!
//! Each test starts a full [`Supervisor`] on loopback with a mock board.
//! Commands are sent to it with a [`FailoverSender`] pointed at the
//! listener, the same path a controller's datagrams take.

mod common;

use std::time::Duration;

use common::{CountingRestart, Sink, config, eventually, unreachable};
use hatlink_bridge::{Supervisor, SupervisorError, TaskTermination};
use hatlink_core::{Destination, Light};
use hatlink_hardware::mock::{MockBoard, MockBoardHandle};
use hatlink_hardware::{Actuator, AnyBoard};
use hatlink_network::{FailoverSender, OscListener, SenderConfig};
use hatlink_protocol::{OscArg, OscMessage};

const WAIT: Duration = Duration::from_secs(2);

async fn start(sink: &Sink, restart: CountingRestart) -> (Supervisor, MockBoardHandle) {
    let (board, handle) = MockBoard::new();
    let supervisor = Supervisor::start(
        config(sink.destination(), unreachable()),
        AnyBoard::Mock(board),
        restart,
    )
    .await
    .unwrap();
    (supervisor, handle)
}

/// A sender aimed at the supervisor's command socket.
async fn controller(supervisor: &Supervisor) -> FailoverSender {
    let port = supervisor.local_addr().port();
    FailoverSender::connect(&SenderConfig {
        primary: Destination::new("127.0.0.1", port),
        backup: Destination::new("127.0.0.1", port),
        timeout: Duration::from_millis(200),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_startup_lights() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;

    assert_eq!(handle.light(Light::Power), 1.0);
    assert_eq!(handle.light(Light::Warn), 0.0);

    supervisor.shutdown().await;
}

/// An input edge on the board reaches the telemetry receiver
#[tokio::test]
async fn test_digital_edge_reaches_receiver() {
    let mut sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;

    handle.set_digital(0, 1);
    let message = sink.next_at("/test-hat/DI1", WAIT).await;
    assert_eq!(message, Some(OscMessage::with_arg("/test-hat/DI1", 1)));

    handle.set_analog(2, 3.5);
    let message = sink.next_at("/test-hat/A3", WAIT).await;
    assert_eq!(
        message,
        Some(OscMessage::with_arg("/test-hat/A3", OscArg::Float(3.5)))
    );

    assert!(supervisor.stats().primary >= 2);
    assert!(supervisor.shutdown().await.is_clean());
}

/// `/relay/1 1` over UDP switches relay 1 on, and `0` switches it off
#[tokio::test]
async fn test_relay_command_over_network() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;
    let controller = controller(&supervisor).await;

    controller.deliver(&OscMessage::with_arg("/relay/1", 1)).await;
    assert!(eventually(WAIT, || handle.relay(1)).await);
    assert!(!handle.relay(0));

    controller.deliver(&OscMessage::with_arg("/relay/1", 0)).await;
    assert!(eventually(WAIT, || !handle.relay(1)).await);

    supervisor.shutdown().await;
}

/// Commands are applied in arrival order
#[tokio::test]
async fn test_commands_applied_in_order() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;
    let controller = controller(&supervisor).await;

    for value in [1, 0, 1, 0, 1] {
        controller.deliver(&OscMessage::with_arg("/output/2", value)).await;
    }

    let output = Actuator::Output(2);
    assert!(eventually(WAIT, || handle.writes_to(output).len() == 5).await);
    assert_eq!(handle.writes_to(output), vec![1.0, 0.0, 1.0, 0.0, 1.0]);

    supervisor.shutdown().await;
}

/// Only `/restart/0 1` triggers the restart action
#[tokio::test]
async fn test_restart_over_network() {
    let sink = Sink::bind().await;
    let restart = CountingRestart::default();
    let (supervisor, handle) = start(&sink, restart.clone()).await;
    let controller = controller(&supervisor).await;

    controller.deliver(&OscMessage::with_arg("/restart/0", 0)).await;
    controller.deliver(&OscMessage::with_arg("/restart/1", 1)).await;
    controller
        .deliver(&OscMessage::with_arg("/restart/0", OscArg::Float(1.0)))
        .await;
    controller.deliver(&OscMessage::with_arg("/restart/0", 1)).await;

    assert!(eventually(WAIT, || restart.calls() == 1).await);
    // Every inbound message pulses the comms light, valid or not.
    let comms = handle.writes_to(Actuator::Light(Light::Comms));
    assert!(comms.iter().filter(|level| **level == 1.0).count() >= 4);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(restart.calls(), 1);

    supervisor.shutdown().await;
}

/// Garbage on the command socket does not stop the listener
#[tokio::test]
async fn test_listener_survives_garbage() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;

    let socket = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(b"\x00\x01garbage", supervisor.local_addr())
        .await
        .unwrap();
    controller(&supervisor)
        .await
        .deliver(&OscMessage::with_arg("/led/2", 1))
        .await;

    assert!(eventually(WAIT, || handle.light(Light::Warn) == 1.0).await);
    let report = supervisor.shutdown().await;
    assert!(report.is_clean());
}

/// A second shutdown returns the first report and touches nothing
#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;

    let first = supervisor.shutdown().await;
    assert!(first.is_clean());
    assert_eq!(
        first.tasks.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        vec!["analog", "inputs", "listener"]
    );
    assert_eq!(handle.light(Light::Power), 0.0);

    let second = supervisor.shutdown().await;
    assert_eq!(first, second);
    assert_eq!(
        handle.writes_to(Actuator::Light(Light::Power)),
        vec![1.0, 0.0]
    );
}

/// Racing shutdown calls all get the same report
#[tokio::test]
async fn test_concurrent_shutdown() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;

    let (a, b, c) = tokio::join!(
        supervisor.shutdown(),
        supervisor.shutdown(),
        supervisor.shutdown()
    );

    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(handle.writes_to(Actuator::Light(Light::Power)).len(), 2);
}

/// A read that is slow but finishes inside the deadline still stops cleanly
#[tokio::test]
async fn test_shutdown_waits_for_inflight_read() {
    let sink = Sink::bind().await;
    let (supervisor, handle) = start(&sink, CountingRestart::default()).await;

    handle.set_read_delay(Some(Duration::from_millis(300)));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let report = supervisor.shutdown().await;
    assert!(report.is_clean(), "{report:?}");
    assert!(report.elapsed < Duration::from_secs(2));
}

/// A read that never returns is aborted at the deadline
#[tokio::test]
async fn test_shutdown_aborts_stuck_tasks() {
    let sink = Sink::bind().await;
    let (board, handle) = MockBoard::new();
    let config = hatlink_core::BridgeConfig {
        shutdown_timeout: Duration::from_millis(200),
        ..config(sink.destination(), unreachable())
    };
    let supervisor = Supervisor::start(config, AnyBoard::Mock(board), CountingRestart::default())
        .await
        .unwrap();

    handle.set_read_delay(Some(Duration::from_secs(30)));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = supervisor.shutdown().await;
    assert!(!report.is_clean());
    assert!(report.elapsed < Duration::from_secs(2), "{report:?}");
    for (name, termination) in &report.tasks {
        match *name {
            "listener" => assert_eq!(*termination, TaskTermination::Completed),
            _ => assert_eq!(*termination, TaskTermination::Aborted, "{name}"),
        }
    }
    assert_eq!(handle.light(Light::Power), 0.0);
}

/// A caller that stops waiting does not lose the shutdown in progress
#[tokio::test]
async fn test_abandoned_shutdown_is_finished_by_next_call() {
    let sink = Sink::bind().await;
    let (board, handle) = MockBoard::new();
    let config = hatlink_core::BridgeConfig {
        shutdown_timeout: Duration::from_millis(200),
        ..config(sink.destination(), unreachable())
    };
    let supervisor = Supervisor::start(config, AnyBoard::Mock(board), CountingRestart::default())
        .await
        .unwrap();

    handle.set_read_delay(Some(Duration::from_secs(30)));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(10), supervisor.shutdown()).await;
    assert!(abandoned.is_err());

    let report = supervisor.shutdown().await;
    assert_eq!(
        report.tasks.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        vec!["analog", "inputs", "listener"]
    );
    assert_eq!(supervisor.shutdown().await, report);
    assert_eq!(
        handle.writes_to(Actuator::Light(Light::Power)),
        vec![1.0, 0.0]
    );
}

/// A signal handler cancels the token; the owner then shuts down
#[tokio::test]
async fn test_stop_request_via_token() {
    let sink = Sink::bind().await;
    let (supervisor, _handle) = start(&sink, CountingRestart::default()).await;

    let token = supervisor.shutdown_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    tokio::time::timeout(WAIT, supervisor.wait_for_stop())
        .await
        .unwrap();
    assert!(supervisor.shutdown().await.is_clean());
}

/// After a clean shutdown the command port is free again
#[tokio::test]
async fn test_listen_port_released() {
    let sink = Sink::bind().await;
    let (supervisor, _handle) = start(&sink, CountingRestart::default()).await;
    let addr = supervisor.local_addr();

    assert!(supervisor.shutdown().await.is_clean());
    assert!(OscListener::bind(addr).await.is_ok());
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let sink = Sink::bind().await;
    let config = hatlink_core::BridgeConfig {
        poll_interval: Duration::ZERO,
        ..config(sink.destination(), unreachable())
    };

    let result = Supervisor::start(config, AnyBoard::absent(), CountingRestart::default()).await;
    assert!(matches!(result, Err(SupervisorError::Config(_))));
}

#[tokio::test]
async fn test_port_in_use_rejected() {
    let sink = Sink::bind().await;
    let taken = OscListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let config = hatlink_core::BridgeConfig {
        listen_port: taken.local_addr().port(),
        ..config(sink.destination(), unreachable())
    };

    let result = Supervisor::start(config, AnyBoard::absent(), CountingRestart::default()).await;
    assert!(matches!(result, Err(SupervisorError::Listener(_))));
}
