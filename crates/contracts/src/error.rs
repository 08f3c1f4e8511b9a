//! Layered error definitions
//!
//! Categorized by source: config / resolution / execution / cursor

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Target Errors =====
    /// Target resolution error
    #[error("failed to resolve targets in namespace '{namespace}': {message}")]
    Resolution { namespace: String, message: String },

    /// Query execution error (statement could not be started)
    #[error("target '{target}' execution error: {message}")]
    Execution { target: String, message: String },

    /// Cursor error (statement failed while rows were being read)
    #[error("target '{target}' cursor error after {rows_read} rows: {message}")]
    Cursor {
        target: String,
        rows_read: u64,
        message: String,
    },

    /// Cursor produced a different number of rows than the caller required
    #[error("expected exactly one row, got {actual}")]
    UnexpectedRowCount { actual: u64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create resolution error
    pub fn resolution(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            namespace: namespace.into(),
            message: message.into(),
        }
    }

    /// Create execution error
    pub fn execution(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create cursor error
    pub fn cursor(target: impl Into<String>, rows_read: u64, message: impl Into<String>) -> Self {
        Self::Cursor {
            target: target.into(),
            rows_read,
            message: message.into(),
        }
    }
}
