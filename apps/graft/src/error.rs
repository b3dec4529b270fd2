//! CLI error handling

use std::fmt;

use graft_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(graft_errors::ConfigError),
    /// Library error
    Resolve(graft_errors::Error),
    /// Resolution finished but recorded errors on some units
    Unresolved { errors: usize },
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Resolve(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Unresolved { errors: 1 } => write!(f, "resolution recorded 1 error"),
            CliError::Unresolved { errors } => write!(f, "resolution recorded {errors} errors"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Resolve(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<graft_errors::ConfigError> for CliError {
    fn from(e: graft_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<graft_errors::Error> for CliError {
    fn from(e: graft_errors::Error) -> Self {
        match e {
            graft_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Resolve(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
