//! # Memstore
//!
//! In-memory replica backend.
//!
//! Responsibilities:
//! - Resolve `TargetConfig`s to live replica handles inside a namespace
//! - Execute statements against seeded fixtures and journal every execution
//! - Inject failures, delays and stalls for fan-out testing
//!
//! Replicas are created lazily on first resolution and live as long as the
//! namespace, so repeated calls with the same name hit the same replica.

pub mod cursor;
pub mod namespace;
pub mod replica;

pub use cursor::MemoryCursor;
pub use namespace::MemoryNamespace;
pub use replica::{ExecutedStatement, MemoryReplica, MemoryTarget, ReplicaBehavior};
