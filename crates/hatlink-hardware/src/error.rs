//! Error types for board I/O.
//!
//! Every failure the bridge can see from the I/O board maps onto one of
//! these variants. None of them is fatal: polling tasks log the error and
//! treat the channel as unchanged, command handlers log and drop the write.

/// Result type alias for board operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while reading or writing board lines.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// A line index outside the board's geometry.
    #[error("No {group} line at index {index} (board has {count})")]
    InvalidLine {
        group: &'static str,
        index: usize,
        count: usize,
    },

    /// Bus or driver level failure.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The driver returned a value the bridge cannot use.
    #[error("Invalid reading: {message}")]
    InvalidReading { message: String },
}

impl HardwareError {
    /// Create a new invalid line error.
    pub fn invalid_line(group: &'static str, index: usize, count: usize) -> Self {
        Self::InvalidLine {
            group,
            index,
            count,
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new invalid reading error.
    pub fn invalid_reading(message: impl Into<String>) -> Self {
        Self::InvalidReading {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_line_error() {
        let error = HardwareError::invalid_line("relay", 4, 3);
        assert_eq!(error.to_string(), "No relay line at index 4 (board has 3)");
    }

    #[test]
    fn test_communication_error() {
        let error = HardwareError::communication("i2c nack");
        assert!(matches!(error, HardwareError::CommunicationError { .. }));
        assert_eq!(error.to_string(), "Communication error: i2c nack");
    }

    #[test]
    fn test_invalid_reading_error() {
        let error = HardwareError::invalid_reading("analog input 0 returned NaN");
        assert!(matches!(error, HardwareError::InvalidReading { .. }));
        assert_eq!(error.to_string(), "Invalid reading: analog input 0 returned NaN");
    }
}
