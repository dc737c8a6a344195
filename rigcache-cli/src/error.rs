//! CLI error type.

use std::fmt;

use rigcache::{ConfigError, ReloadError};

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded, saved or resolved.
    Config(String),
    /// A reload failed outright.
    Reload(ReloadError),
    /// The async runtime could not be started.
    Runtime(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Reload(e) => write!(f, "Reload failed: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Reload(e) => Some(e),
            CliError::Runtime(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ReloadError> for CliError {
    fn from(e: ReloadError) -> Self {
        CliError::Reload(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Runtime(e)
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Reload(_) | CliError::Runtime(_) => 1,
        }
    }
}
