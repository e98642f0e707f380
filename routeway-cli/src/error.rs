//! Error types for the routeway CLI.

use routeway_client::RouteError;
use routeway_config::ConfigError;
use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    Config(ConfigError),

    /// Route table or resolution error
    Route(RouteError),

    /// Invalid argument
    InvalidArgument(String),

    /// A dispatched call did not succeed
    Failed(String),

    /// Some probed endpoints are not connected
    Unreachable { failed: usize, total: usize },

    /// The probe run was interrupted before every endpoint was checked
    Cancelled { completed: usize, total: usize },
}

impl CliError {
    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::InvalidArgument(_) => 2,
            CliError::Route(e) if e.is_configuration() => 2,
            CliError::Cancelled { .. } => 130,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Route(e) => write!(f, "{}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Failed(msg) => write!(f, "Request failed: {}", msg),
            CliError::Unreachable { failed, total } => {
                write!(f, "{} of {} endpoints are not connected", failed, total)
            }
            CliError::Cancelled { completed, total } => {
                write!(f, "Probe cancelled after {} of {} endpoints", completed, total)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<RouteError> for CliError {
    fn from(e: RouteError) -> Self {
        CliError::Route(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidArgument(e.to_string())
    }
}
