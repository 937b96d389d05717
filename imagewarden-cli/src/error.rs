//! CLI-specific error types and exit code mapping

use imagewarden_core::error::{ConfigError, ScanFailure, WardenError};
use imagewarden_core::types::RiskLevel;
use imagewarden_scan_engine::{ScanEngineError, ScanError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The Docker daemon could not be reached.
    #[error("docker not reachable: {0}")]
    DockerUnavailable(String),

    /// The verdict reached the `--fail-on` threshold.
    #[error("risk level {level} (score {score}) is at or above the --fail-on threshold {threshold}")]
    RiskThreshold {
        level: RiskLevel,
        score: u8,
        threshold: RiskLevel,
    },

    /// The image is neither local nor pullable.
    #[error("{0}")]
    Resolution(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | General / command error               |
    /// | 2    | Configuration error                   |
    /// | 3    | Docker unreachable                    |
    /// | 4    | Verdict at or above `--fail-on` level |
    /// | 5    | Image could not be found or pulled    |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::DockerUnavailable(_) => 3,
            Self::RiskThreshold { .. } => 4,
            Self::Resolution(_) => 5,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<WardenError> for CliError {
    fn from(e: WardenError) -> Self {
        match e {
            WardenError::Config(err) => Self::Config(err.to_string()),
            WardenError::Scan(ScanFailure::RuntimeUnavailable(msg)) => Self::DockerUnavailable(msg),
            WardenError::Scan(ScanFailure::Resolution(image)) => Self::Resolution(
                ScanError::ResolutionFailure { image }.to_string(),
            ),
            WardenError::Io(err) => Self::Io(err),
            other => Self::Command(other.to_string()),
        }
    }
}

impl From<ScanEngineError> for CliError {
    fn from(e: ScanEngineError) -> Self {
        match e {
            ScanEngineError::DockerConnection(msg) => Self::DockerUnavailable(msg),
            ScanEngineError::Config { field, reason } => {
                Self::Config(ConfigError::InvalidValue { field, reason }.to_string())
            }
            other => Self::from(WardenError::from(other)),
        }
    }
}

impl From<ScanError> for CliError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::InvalidImageRef(_) => Self::Command(e.to_string()),
            ScanError::ResolutionFailure { .. } => Self::Resolution(e.to_string()),
        }
    }
}
