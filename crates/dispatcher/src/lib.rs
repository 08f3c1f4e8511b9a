//! # Dispatcher
//!
//! Primary-plus-mirrors query fan-out.
//!
//! Responsibilities:
//! - Resolve an ordered target list, first target is main
//! - Return the main target's cursor to the caller
//! - Replay the identical query on every mirror in a detached task
//! - Swallow and log every mirror failure, never blocking the main path

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod mirror;

pub use context::BackgroundTasks;
pub use contracts::{ExecutionContext, Query, TargetConfig, TargetResolver};
pub use dispatcher::{multistub_query, CursorOf, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, MirrorMetrics};
pub use mirror::{MirrorOutcome, MirrorReport};
