//! Stand-in used when no board answers at startup.

use crate::Result;
use crate::traits::IoBackend;
use crate::types::{Actuator, BoardInfo, check_analog, check_digital};

/// A board that is not there.
///
/// Reads return zero and writes are dropped, so every handler keeps working
/// when the bridge runs on a host without the HAT. Index checks still apply
/// so that bugs surface the same way with and without hardware.
///
/// # Examples
///
/// ```
/// use hatlink_hardware::absent::AbsentBoard;
/// use hatlink_hardware::traits::IoBackend;
///
/// #[tokio::main]
/// async fn main() -> hatlink_hardware::Result<()> {
///     let board = AbsentBoard::new();
///     assert!(!board.is_present());
///     assert_eq!(board.read_analog(0).await?, 0.0);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AbsentBoard;

impl AbsentBoard {
    pub fn new() -> Self {
        Self
    }
}

impl IoBackend for AbsentBoard {
    fn is_present(&self) -> bool {
        false
    }

    fn info(&self) -> BoardInfo {
        BoardInfo {
            name: "absent".to_string(),
            present: false,
        }
    }

    async fn read_digital(&self, index: usize) -> Result<u8> {
        check_digital(index)?;
        Ok(0)
    }

    async fn read_analog(&self, index: usize) -> Result<f32> {
        check_analog(index)?;
        Ok(0.0)
    }

    async fn write(&self, actuator: Actuator, _level: f32) -> Result<()> {
        actuator.validate()
    }
}
