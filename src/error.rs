//! Error types for pulsekey
//!
//! None of these are fatal to the process: configuration problems are
//! replaced by defaults, listener and injection failures degrade the
//! engine to a blocked status.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or saving the settings snapshot
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Errors starting the global input listener
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The OS refused access to global input state
    #[error("input monitoring permission denied")]
    PermissionDenied,
    /// Backend did not come up in time
    #[error("input listener did not start within {0:?}")]
    StartupTimeout(Duration),
    /// Listener thread exited before reporting readiness
    #[error("input listener thread exited during startup")]
    ThreadDied,
    /// Listener thread exited after a successful start
    #[error("input listener thread stopped unexpectedly")]
    Stopped,
    /// Thread could not be spawned
    #[error("failed to spawn listener thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Errors injecting synthetic output
#[derive(Error, Debug)]
pub enum InjectError {
    /// No injection backend in this build or environment
    #[error("output injection unavailable: {0}")]
    Unavailable(String),
    /// Backend failed to initialise
    #[error("failed to initialise output backend: {0}")]
    Init(String),
    /// The OS rejected a synthetic event
    #[error("output blocked: {0}")]
    Send(String),
}

/// Errors exporting a measurement report
#[derive(Error, Debug)]
pub enum ReportError {
    /// No finished measurement to export
    #[error("no finished rate test to export")]
    NoResult,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let err = ListenerError::PermissionDenied;
        assert_eq!(err.to_string(), "input monitoring permission denied");

        let err = InjectError::Send("denied".to_string());
        assert_eq!(err.to_string(), "output blocked: denied");
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }
}
