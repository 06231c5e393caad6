//! In-memory board for testing and `--simulate` runs.
//!
//! [`MockBoard`] keeps every line in shared memory. The paired
//! [`MockBoardHandle`] lets tests and the simulator move inputs, inspect
//! actuators and inject failures while the bridge is running.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use hatlink_core::Light;
use hatlink_core::constants::{ACTUATOR_INDEX_COUNT, ANALOG_INPUT_COUNT, DIGITAL_INPUT_COUNT};

use crate::traits::IoBackend;
use crate::types::{Actuator, BoardInfo, check_analog, check_digital};
use crate::{HardwareError, Result};

/// Writes kept for inspection. Older entries are dropped first, so a long
/// `--simulate` run stays bounded.
pub const WRITE_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct BoardState {
    digital: [u8; DIGITAL_INPUT_COUNT],
    analog: [f32; ANALOG_INPUT_COUNT],
    relays: [bool; ACTUATOR_INDEX_COUNT],
    outputs: [bool; ACTUATOR_INDEX_COUNT],
    lights: [f32; 3],
    writes: VecDeque<(Actuator, f32)>,
    digital_reads: usize,
    analog_reads: usize,
    fail_reads: bool,
    fail_writes: bool,
    read_delay: Option<Duration>,
}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    // A panicking test thread must not take the board down with it.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock I/O board.
///
/// # Examples
///
/// ```
/// use hatlink_hardware::mock::MockBoard;
/// use hatlink_hardware::traits::IoBackend;
/// use hatlink_hardware::Actuator;
///
/// #[tokio::main]
/// async fn main() -> hatlink_hardware::Result<()> {
///     let (board, handle) = MockBoard::new();
///
///     handle.set_digital(0, 1);
///     assert_eq!(board.read_digital(0).await?, 1);
///
///     board.write(Actuator::Relay(1), 1.0).await?;
///     assert!(handle.relay(1));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockBoard {
    state: Arc<Mutex<BoardState>>,
    name: String,
}

impl MockBoard {
    /// Create a new mock board with every line at zero.
    pub fn new() -> (Self, MockBoardHandle) {
        Self::with_name("Mock Automation HAT".to_string())
    }

    /// Create a new mock board with a custom name.
    pub fn with_name(name: String) -> (Self, MockBoardHandle) {
        let state = Arc::new(Mutex::new(BoardState::default()));
        let board = Self {
            state: Arc::clone(&state),
            name,
        };
        (board, MockBoardHandle { state })
    }

    async fn before_read(&self) -> Result<()> {
        let (delay, fail) = {
            let state = lock(&self.state);
            (state.read_delay, state.fail_reads)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(HardwareError::communication("injected read failure"));
        }
        Ok(())
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new().0
    }
}

impl IoBackend for MockBoard {
    fn is_present(&self) -> bool {
        true
    }

    fn info(&self) -> BoardInfo {
        BoardInfo {
            name: self.name.clone(),
            present: true,
        }
    }

    async fn read_digital(&self, index: usize) -> Result<u8> {
        check_digital(index)?;
        self.before_read().await?;
        let mut state = lock(&self.state);
        state.digital_reads += 1;
        Ok(state.digital[index])
    }

    async fn read_analog(&self, index: usize) -> Result<f32> {
        check_analog(index)?;
        self.before_read().await?;
        let mut state = lock(&self.state);
        state.analog_reads += 1;
        Ok(state.analog[index])
    }

    async fn write(&self, actuator: Actuator, level: f32) -> Result<()> {
        actuator.validate()?;
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(HardwareError::communication("injected write failure"));
        }
        let on = level > 0.0;
        match actuator {
            Actuator::Relay(index) => state.relays[index] = on,
            Actuator::Output(index) => state.outputs[index] = on,
            Actuator::Light(light) => state.lights[light.index()] = level.clamp(0.0, 1.0),
        }
        if state.writes.len() == WRITE_LOG_CAPACITY {
            state.writes.pop_front();
        }
        state.writes.push_back((actuator, level));
        Ok(())
    }
}

/// Handle for driving and inspecting a [`MockBoard`].
///
/// Cloneable; every clone sees the same board.
#[derive(Debug, Clone)]
pub struct MockBoardHandle {
    state: Arc<Mutex<BoardState>>,
}

impl MockBoardHandle {
    /// Set digital input `index`. Out-of-range indices are ignored.
    pub fn set_digital(&self, index: usize, value: u8) {
        if let Some(line) = lock(&self.state).digital.get_mut(index) {
            *line = value;
        }
    }

    /// Set analog input `index`. Out-of-range indices are ignored.
    pub fn set_analog(&self, index: usize, value: f32) {
        if let Some(line) = lock(&self.state).analog.get_mut(index) {
            *line = value;
        }
    }

    pub fn relay(&self, index: usize) -> bool {
        lock(&self.state).relays.get(index).copied().unwrap_or(false)
    }

    pub fn output(&self, index: usize) -> bool {
        lock(&self.state).outputs.get(index).copied().unwrap_or(false)
    }

    /// Current brightness of an indicator light.
    pub fn light(&self, light: Light) -> f32 {
        lock(&self.state).lights[light.index()]
    }

    /// The last [`WRITE_LOG_CAPACITY`] successful writes, oldest first.
    pub fn writes(&self) -> Vec<(Actuator, f32)> {
        lock(&self.state).writes.iter().copied().collect()
    }

    /// Writes to a single actuator, oldest first.
    pub fn writes_to(&self, actuator: Actuator) -> Vec<f32> {
        lock(&self.state)
            .writes
            .iter()
            .filter(|(a, _)| *a == actuator)
            .map(|(_, level)| *level)
            .collect()
    }

    pub fn clear_writes(&self) {
        lock(&self.state).writes.clear();
    }

    /// Number of completed digital reads.
    pub fn digital_reads(&self) -> usize {
        lock(&self.state).digital_reads
    }

    /// Number of completed analog reads.
    pub fn analog_reads(&self) -> usize {
        lock(&self.state).analog_reads
    }

    /// Make every read fail until cleared.
    pub fn fail_reads(&self, fail: bool) {
        lock(&self.state).fail_reads = fail;
    }

    /// Make every write fail until cleared.
    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Stall every read for `delay`, simulating a slow bus.
    pub fn set_read_delay(&self, delay: Option<Duration>) {
        lock(&self.state).read_delay = delay;
    }
}
