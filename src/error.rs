use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed calibration record: {0}")]
    MalformedRecord(String),

    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    #[error("Unknown channel: {0:?}")]
    UnknownChannel(String),

    #[error("Actuator write failed on {channel}: {reason}")]
    ActuatorWrite { channel: String, reason: String },

    #[error("Landmark source error: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
