/// Centralized error types for repo-pulse using thiserror
///
/// Only whole-scan setup problems surface as errors. Per-repository failures
/// (spawn errors, non-zero exits, malformed output) are absorbed by the
/// orchestrator and show up as repositories that contributed no commits.
use thiserror::Error;

/// Main error type for repo-pulse
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to scan request validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Directory cannot be read: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("{field} must be {constraint}, got {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },
}

/// Errors related to resolving the local git identity
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error(
        "Author filter 'me' requires a git identity; set one with `git config --global user.name` or `user.email`"
    )]
    Unconfigured,

    #[error("Failed to query git config: {0}")]
    QueryFailed(String),
}

/// Errors raised while driving a scan as a whole
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to start async runtime: {0}")]
    RuntimeFailed(String),

    #[error("Directory scan task failed: {0}")]
    TaskFailed(String),
}

// Conversion from anyhow::Error to PulseError
impl From<anyhow::Error> for PulseError {
    fn from(err: anyhow::Error) -> Self {
        PulseError::Other(format!("{:#}", err))
    }
}

impl PulseError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        PulseError::Other(msg.into())
    }

    /// Check if this is a user-correctable error (bad input, missing identity)
    /// rather than a system failure
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PulseError::Validation(_)
                | PulseError::Identity(IdentityError::Unconfigured)
                | PulseError::Config(ConfigError::InvalidValue { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PulseError::Validation(ValidationError::PathNotFound("/test".to_string()));
        assert_eq!(
            err.to_string(),
            "Validation error: Path does not exist: /test"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PulseError = io_err.into();
        assert!(matches!(err, PulseError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: PulseError = anyhow::anyhow!("test error").into();
        assert!(matches!(err, PulseError::Other(_)));
    }

    #[test]
    fn test_unconfigured_identity_is_user_error() {
        let err: PulseError = IdentityError::Unconfigured.into();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("git config --global user.name"));
    }

    #[test]
    fn test_query_failure_is_not_user_error() {
        let err: PulseError = IdentityError::QueryFailed("git not found".to_string()).into();
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_validation_constraint() {
        let err = ValidationError::ConstraintViolation {
            field: "max_depth".to_string(),
            constraint: "greater than 0".to_string(),
            actual: "0".to_string(),
        };
        assert_eq!(err.to_string(), "max_depth must be greater than 0, got 0");
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            key: "scan.concurrency_limit".to_string(),
            reason: "must be greater than 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'scan.concurrency_limit': must be greater than 0"
        );
    }

    #[test]
    fn test_error_chain() {
        let err: PulseError = ScanError::TaskFailed("panicked".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Scan error: Directory scan task failed: panicked"
        );
    }
}
