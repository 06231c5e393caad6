//! Board line types shared by every backend.

use hatlink_core::Light;
use hatlink_core::constants::{ACTUATOR_INDEX_COUNT, ANALOG_INPUT_COUNT, DIGITAL_INPUT_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{HardwareError, Result};

/// A writable line on the board.
///
/// Relays and outputs are switched: any level above zero turns them on.
/// Lights are dimmable and take the level as brightness in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    Relay(usize),
    Output(usize),
    Light(Light),
}

impl Actuator {
    /// Check the index against the board geometry.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidLine` for relay or output indices the
    /// board does not have. Lights are a closed enum and always valid.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Relay(index) if index >= ACTUATOR_INDEX_COUNT => Err(
                HardwareError::invalid_line("relay", index, ACTUATOR_INDEX_COUNT),
            ),
            Self::Output(index) if index >= ACTUATOR_INDEX_COUNT => Err(
                HardwareError::invalid_line("output", index, ACTUATOR_INDEX_COUNT),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relay(index) => write!(f, "relay {index}"),
            Self::Output(index) => write!(f, "output {index}"),
            Self::Light(light) => write!(f, "{light} light"),
        }
    }
}

pub(crate) fn check_digital(index: usize) -> Result<()> {
    if index >= DIGITAL_INPUT_COUNT {
        return Err(HardwareError::invalid_line(
            "digital input",
            index,
            DIGITAL_INPUT_COUNT,
        ));
    }
    Ok(())
}

pub(crate) fn check_analog(index: usize) -> Result<()> {
    if index >= ANALOG_INPUT_COUNT {
        return Err(HardwareError::invalid_line(
            "analog input",
            index,
            ANALOG_INPUT_COUNT,
        ));
    }
    Ok(())
}

pub(crate) fn check_reading(index: usize, value: f32) -> Result<f32> {
    if !value.is_finite() {
        return Err(HardwareError::invalid_reading(format!(
            "analog input {index} returned {value}"
        )));
    }
    Ok(value)
}

/// Static description of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    /// Human readable board name.
    pub name: String,

    /// Whether physical writes reach hardware.
    pub present: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Actuator::Relay(0), true)]
    #[case(Actuator::Relay(2), true)]
    #[case(Actuator::Relay(3), false)]
    #[case(Actuator::Output(7), false)]
    #[case(Actuator::Light(Light::Warn), true)]
    fn test_actuator_validate(#[case] actuator: Actuator, #[case] valid: bool) {
        assert_eq!(actuator.validate().is_ok(), valid);
    }

    #[test]
    fn test_input_bounds() {
        assert!(check_digital(2).is_ok());
        assert!(check_digital(3).is_err());
        assert!(check_analog(0).is_ok());
        assert!(check_analog(3).is_err());
    }

    #[test]
    fn test_check_reading() {
        assert_eq!(check_reading(0, -0.5).unwrap(), -0.5);
        let error = check_reading(2, f32::NAN).unwrap_err();
        assert_eq!(error.to_string(), "Invalid reading: analog input 2 returned NaN");
    }

    #[test]
    fn test_actuator_display() {
        assert_eq!(Actuator::Relay(1).to_string(), "relay 1");
        assert_eq!(Actuator::Light(Light::Comms).to_string(), "comms light");
    }

    #[test]
    fn test_actuator_serialization() {
        let json = serde_json::to_string(&Actuator::Relay(1)).unwrap();
        assert_eq!(json, r#"{"relay":1}"#);

        let light: Actuator = serde_json::from_str(r#"{"light":"warn"}"#).unwrap();
        assert_eq!(light, Actuator::Light(Light::Warn));
    }
}
