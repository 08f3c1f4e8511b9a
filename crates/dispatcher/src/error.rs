//! Dispatcher error types
//!
//! Only main-path failures are represented here; mirror failures never leave
//! the mirror task.

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// No target to use as main
    #[error("empty target set: at least one target is required")]
    EmptyTargetSet,

    /// Target resolution failed
    #[error("failed to resolve targets in namespace '{namespace}'")]
    Resolution {
        namespace: String,
        #[source]
        source: ContractError,
    },

    /// Resolver broke its ordering contract
    #[error("resolver returned {actual} targets for {expected} configs")]
    ResolutionMismatch { expected: usize, actual: usize },

    /// Main target could not produce a cursor
    #[error("main target '{target}' failed to execute query")]
    MainExecution {
        target: String,
        #[source]
        source: ContractError,
    },
}

impl DispatcherError {
    /// Create a resolution error
    pub fn resolution(namespace: impl Into<String>, source: ContractError) -> Self {
        Self::Resolution {
            namespace: namespace.into(),
            source,
        }
    }

    /// Create a main execution error
    pub fn main_execution(target: impl Into<String>, source: ContractError) -> Self {
        Self::MainExecution {
            target: target.into(),
            source,
        }
    }
}
