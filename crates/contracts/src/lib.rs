//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Target Model
//! - A call supplies an ordered list of `TargetConfig`s
//! - The first resolved target is the main target, all others are mirrors
//! - Only the main target's cursor is ever handed back to the caller

mod blueprint;
mod cursor;
mod error;
mod runtime;
mod target;
mod value;

pub use blueprint::*;
pub use cursor::{collect_rows, drain, one, LocalRowCursor, RowCursor};
pub use error::*;
pub use runtime::*;
pub use target::*;
pub use value::*;
