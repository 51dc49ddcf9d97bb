use std::fmt;
use std::str::FromStr;

use crate::calibration::CalibrationTarget;
use crate::error::{Error, Result};

/// Keys: `o` open, `c` close, `m` wrist min, `x` wrist max, `s` clear, `q` quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    StartOpenCapture,
    StartCloseCapture,
    StartWristMinCapture,
    StartWristMaxCapture,
    ClearCalibration,
    Quit,
}

impl OperatorCommand {
    pub fn from_key(key: char) -> Result<Self> {
        match key.to_ascii_lowercase() {
            'o' => Ok(Self::StartOpenCapture),
            'c' => Ok(Self::StartCloseCapture),
            'm' => Ok(Self::StartWristMinCapture),
            'x' => Ok(Self::StartWristMaxCapture),
            's' => Ok(Self::ClearCalibration),
            'q' => Ok(Self::Quit),
            other => Err(Error::InvalidCommand(other.to_string())),
        }
    }

    pub fn key(&self) -> char {
        match self {
            Self::StartOpenCapture => 'o',
            Self::StartCloseCapture => 'c',
            Self::StartWristMinCapture => 'm',
            Self::StartWristMaxCapture => 'x',
            Self::ClearCalibration => 's',
            Self::Quit => 'q',
        }
    }

    /// Capture target for the four start commands.
    pub fn target(&self) -> Option<CalibrationTarget> {
        match self {
            Self::StartOpenCapture => Some(CalibrationTarget::Open),
            Self::StartCloseCapture => Some(CalibrationTarget::Close),
            Self::StartWristMinCapture => Some(CalibrationTarget::WristMin),
            Self::StartWristMaxCapture => Some(CalibrationTarget::WristMax),
            Self::ClearCalibration | Self::Quit => None,
        }
    }

    /// Idle menu shown to the operator.
    pub fn menu() -> &'static str {
        "Press 'o' for open calibration\n\
         Press 'c' for close calibration\n\
         Press 's' to reset calibration\n\
         Press 'm' for wrist minimum calibration\n\
         Press 'x' for wrist maximum calibration\n\
         Press 'q' to quit"
    }
}

impl FromStr for OperatorCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::from_key(c);
        }
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::StartOpenCapture),
            "close" => Ok(Self::StartCloseCapture),
            "wrist_min" | "wrist-min" => Ok(Self::StartWristMinCapture),
            "wrist_max" | "wrist-max" => Ok(Self::StartWristMaxCapture),
            "clear" | "reset" => Ok(Self::ClearCalibration),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(Error::InvalidCommand(s.to_string())),
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartOpenCapture => "open",
            Self::StartCloseCapture => "close",
            Self::StartWristMinCapture => "wrist_min",
            Self::StartWristMaxCapture => "wrist_max",
            Self::ClearCalibration => "clear",
            Self::Quit => "quit",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_names_agree() {
        let all = [
            OperatorCommand::StartOpenCapture,
            OperatorCommand::StartCloseCapture,
            OperatorCommand::StartWristMinCapture,
            OperatorCommand::StartWristMaxCapture,
            OperatorCommand::ClearCalibration,
            OperatorCommand::Quit,
        ];
        for cmd in all {
            assert_eq!(OperatorCommand::from_key(cmd.key()).unwrap(), cmd);
            assert_eq!(cmd.to_string().parse::<OperatorCommand>().unwrap(), cmd);
        }
    }

    #[test]
    fn unknown_key_is_invalid() {
        assert!(matches!(OperatorCommand::from_key('z'), Err(Error::InvalidCommand(_))));
        assert!(matches!("wave".parse::<OperatorCommand>(), Err(Error::InvalidCommand(_))));
    }

    #[test]
    fn only_start_commands_have_targets() {
        assert_eq!(
            OperatorCommand::StartWristMaxCapture.target(),
            Some(CalibrationTarget::WristMax)
        );
        assert_eq!(OperatorCommand::ClearCalibration.target(), None);
    }
}
