//! Error types and handling for Chargeguard
//!
//! This module defines the error types used throughout the crate. Faults that
//! are local to a single balancing tick (an unreadable sensor, a charger that
//! does not answer) are reported as tick outcomes by the controller; the
//! variants here are the ones that travel to a caller.

use thiserror::Error;

/// Result type alias for Chargeguard operations
pub type Result<T> = std::result::Result<T, ChargeGuardError>;

/// Main error type for Chargeguard
#[derive(Debug, Error)]
pub enum ChargeGuardError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// No phase sensors configured
    #[error("No phase sensors configured")]
    NoSensors,

    /// The charger could not be queried or commanded (start/stop/status)
    #[error("Charger error: {message}")]
    Charger { message: String },

    /// The charger did not accept a set of phase limits
    #[error("Dispatch error: {message}")]
    Dispatch { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl ChargeGuardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ChargeGuardError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new charger error
    pub fn charger<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Charger {
            message: message.into(),
        }
    }

    /// Create a new dispatch error
    pub fn dispatch<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Dispatch {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ChargeGuardError::Io {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ChargeGuardError {
    fn from(err: std::io::Error) -> Self {
        ChargeGuardError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChargeGuardError {
    fn from(err: serde_yaml::Error) -> Self {
        ChargeGuardError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChargeGuardError {
    fn from(err: serde_json::Error) -> Self {
        ChargeGuardError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ChargeGuardError::config("test config error");
        assert!(matches!(err, ChargeGuardError::Config { .. }));

        let err = ChargeGuardError::dispatch("rejected");
        assert!(matches!(err, ChargeGuardError::Dispatch { .. }));

        let err = ChargeGuardError::validation("field", "test validation error");
        assert!(matches!(err, ChargeGuardError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ChargeGuardError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = ChargeGuardError::validation("sampling.filter_window", "must be positive");
        assert_eq!(
            format!("{}", err),
            "Validation error: sampling.filter_window - must be positive"
        );

        assert_eq!(
            format!("{}", ChargeGuardError::NoSensors),
            "No phase sensors configured"
        );
    }
}
