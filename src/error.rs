use std::time::Duration;

use thiserror::Error;

use crate::actuator::DisplayAction;

/// Failure of a single device actuator invocation.
///
/// These never escape the all-devices operation: they are logged at the
/// invocation boundary and folded into a boolean result.
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("{action} {device} timed out after {timeout:?}")]
    Timeout {
        action: DisplayAction,
        device: String,
        timeout: Duration,
    },

    #[error("{action} {device} failed ({status}): {diagnostic}")]
    Failed {
        action: DisplayAction,
        device: String,
        status: String,
        diagnostic: String,
    },

    #[error("failed to launch {action} command for {device}: {source}")]
    Launch {
        action: DisplayAction,
        device: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to turn on displays")]
    ActivationFailed,

    #[error("Turn-off delay {0:?} is out of range")]
    ScheduleOutOfRange(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DisplayError>;
