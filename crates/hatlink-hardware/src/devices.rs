//! Enum wrapper for board dispatch.
//!
//! The bridge picks its board at runtime (hardware detection, `--simulate`), but
//! [`IoBackend`] uses `impl Future` returns and cannot be made into a trait
//! object. [`AnyBoard`] closes over the known backends instead, giving the
//! supervisor one concrete type to share between its tasks.
//!
//! # Examples
//!
//! ```
//! use hatlink_hardware::devices::AnyBoard;
//! use hatlink_hardware::mock::MockBoard;
//! use hatlink_hardware::traits::IoBackend;
//!
//! let (board, _handle) = MockBoard::new();
//! let board = AnyBoard::Mock(board);
//! assert!(board.is_present());
//!
//! let absent = AnyBoard::absent();
//! assert!(!absent.is_present());
//! ```

use crate::Result;
use crate::absent::AbsentBoard;
use crate::mock::MockBoard;
use crate::traits::IoBackend;
use crate::types::{Actuator, BoardInfo, check_reading};

/// Any supported board.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyBoard {
    /// In-memory board for tests and simulation.
    Mock(MockBoard),
    /// No hardware; reads are zero and writes are no-ops.
    Absent(AbsentBoard),
}

impl AnyBoard {
    pub fn absent() -> Self {
        Self::Absent(AbsentBoard::new())
    }
}

impl IoBackend for AnyBoard {
    fn is_present(&self) -> bool {
        match self {
            Self::Mock(board) => board.is_present(),
            Self::Absent(board) => board.is_present(),
        }
    }

    fn info(&self) -> BoardInfo {
        match self {
            Self::Mock(board) => board.info(),
            Self::Absent(board) => board.info(),
        }
    }

    async fn read_digital(&self, index: usize) -> Result<u8> {
        match self {
            Self::Mock(board) => board.read_digital(index).await,
            Self::Absent(board) => board.read_digital(index).await,
        }
    }

    /// Non-finite samples are turned into `HardwareError::InvalidReading`
    /// here, so no backend can hand the bridge a NaN.
    async fn read_analog(&self, index: usize) -> Result<f32> {
        let value = match self {
            Self::Mock(board) => board.read_analog(index).await,
            Self::Absent(board) => board.read_analog(index).await,
        }?;
        check_reading(index, value)
    }

    async fn write(&self, actuator: Actuator, level: f32) -> Result<()> {
        match self {
            Self::Mock(board) => board.write(actuator, level).await,
            Self::Absent(board) => board.write(actuator, level).await,
        }
    }
}

impl From<MockBoard> for AnyBoard {
    fn from(board: MockBoard) -> Self {
        Self::Mock(board)
    }
}

impl From<AbsentBoard> for AnyBoard {
    fn from(board: AbsentBoard) -> Self {
        Self::Absent(board)
    }
}
