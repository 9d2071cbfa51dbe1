//! Error types for the tracking library

use thiserror::Error;

/// Result type alias for the tracking library
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur while configuring or running a tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Unknown dataset class table: {0}")]
    UnknownDataset(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid time lag: {0} (must be finite and non-negative)")]
    InvalidTimeLag(f32),

    #[error("Kalman filter error: {0}")]
    FilterError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl TrackerError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn filter<S: Into<String>>(msg: S) -> Self {
        Self::FilterError(msg.into())
    }
}
