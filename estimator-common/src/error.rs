//! Errors raised while preparing a run (locating, reading and checking
//! configuration).

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// Shared error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to read config from {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

impl Error {
    /// Whether the caller can fix this by changing their input or config.
    pub fn is_user_correctable(&self) -> bool {
        match self {
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::Invalid(_) => true,
            Self::ConfigRead { .. } => false,
        }
    }

    /// 2 for user-correctable errors, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_user_correctable() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_user_correctable() {
        let missing = Error::ConfigNotFound {
            path: PathBuf::from("/etc/estimator.json"),
        };
        assert!(missing.is_user_correctable());
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(missing.to_string(), "Config file not found: /etc/estimator.json");

        let invalid = Error::from(ValidationError::MissingField {
            field: "backtest".into(),
        });
        assert!(invalid.is_user_correctable());
    }

    #[test]
    fn test_read_failure_is_not_user_correctable() {
        let err = Error::ConfigRead {
            path: PathBuf::from("config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_user_correctable());
        assert_eq!(err.exit_code(), 1);
    }
}
