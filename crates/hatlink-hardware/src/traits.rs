//! Board trait definition.
//!
//! [`IoBackend`] is the narrow contract between the bridge and the I/O
//! board driver. The bridge never talks to a bus directly; it reads lines
//! and writes actuators through this trait, which keeps polling and command
//! handling testable against [`MockBoard`](crate::mock::MockBoard).
//!
//! Methods take `&self`: the analog poller, the input monitor and the command
//! dispatcher all hold the same board concurrently. Implementations are
//! responsible for their own interior synchronization. Each line is only ever
//! driven by one task, so implementations need not order writes across tasks.
//!
//! The async methods return `impl Future + Send` so that generic callers can
//! move the futures into spawned tasks. Implementors may still write them as
//! plain `async fn`.

use std::future::Future;

use crate::Result;
use crate::types::{Actuator, BoardInfo};

/// Digital and analog I/O with switched and dimmable outputs.
pub trait IoBackend: Send + Sync {
    /// Whether physical hardware answered at startup.
    ///
    /// When this is `false` reads return zero and writes are accepted
    /// without effect, so the bridge can run dry.
    fn is_present(&self) -> bool;

    /// Describe the board for startup logging.
    fn info(&self) -> BoardInfo;

    /// Read digital input `index` as `0` or `1`.
    fn read_digital(&self, index: usize) -> impl Future<Output = Result<u8>> + Send;

    /// Read analog input `index` in the board's native unit (volts).
    fn read_analog(&self, index: usize) -> impl Future<Output = Result<f32>> + Send;

    /// Drive an actuator. Switched lines treat any `level > 0.0` as on.
    fn write(&self, actuator: Actuator, level: f32) -> impl Future<Output = Result<()>> + Send;
}
