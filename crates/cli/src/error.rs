//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Query parameter could not be parsed
    #[error("Invalid query parameter #{index} '{raw}': {message}")]
    InvalidParam {
        index: usize,
        raw: String,
        message: String,
    },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_param(index: usize, raw: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            index,
            raw: raw.into(),
            message: message.into(),
        }
    }
}
