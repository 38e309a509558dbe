//! # Error Types
//!
//! Custom error types for the J7-C monitor using `thiserror`.

use thiserror::Error;

/// Main error type for the J7-C monitor
#[derive(Debug, Error)]
pub enum MeterError {
    /// J7-C wire protocol errors
    #[error("J7-C protocol error: {0}")]
    Protocol(String),

    /// Device discovery failed (adapter missing, permission denied, ...)
    #[error("Device discovery failed: {0}")]
    Discovery(String),

    /// No compatible device was found during discovery
    #[error("No target device found: {0}")]
    DeviceNotFound(String),

    /// Connecting to the device failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// An established connection went away
    #[error("Connection to device lost")]
    ConnectionLost,

    /// A feature that was selected is not available yet
    #[error("{0}: NOT YET IMPLEMENTED")]
    NotImplemented(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MeterError {
    /// Process exit code for this error class
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | 1 | Output or other runtime failure |
    /// | 2 | Configuration rejected (including not-implemented modes) |
    /// | 3 | Discovery failed or no device found |
    /// | 4 | Connection failed or lost |
    pub fn exit_code(&self) -> u8 {
        match self {
            MeterError::Config(_) | MeterError::NotImplemented(_) => 2,
            MeterError::Discovery(_) | MeterError::DeviceNotFound(_) => 3,
            MeterError::Connect(_) | MeterError::ConnectionLost => 4,
            MeterError::Protocol(_) | MeterError::Io(_) | MeterError::Json(_) => 1,
        }
    }
}

/// Result type alias for the J7-C monitor
pub type Result<T> = std::result::Result<T, MeterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        let config = MeterError::Config(toml::de::Error::custom("bad"));
        let not_impl = MeterError::NotImplemented("InfluxDB".to_string());
        let not_found = MeterError::DeviceNotFound("UC96_BLE".to_string());
        let discovery = MeterError::Discovery("no adapter".to_string());
        let connect = MeterError::Connect("timeout".to_string());

        assert_eq!(config.exit_code(), 2);
        assert_eq!(not_impl.exit_code(), 2);
        assert_eq!(not_found.exit_code(), 3);
        assert_eq!(discovery.exit_code(), 3);
        assert_eq!(connect.exit_code(), 4);
        assert_eq!(MeterError::ConnectionLost.exit_code(), 4);
    }

    #[test]
    fn test_not_implemented_message() {
        let err = MeterError::NotImplemented("InfluxDB output".to_string());
        assert_eq!(err.to_string(), "InfluxDB output: NOT YET IMPLEMENTED");
    }
}
