//! ExecutionContext - background-task facility provided by the host
//!
//! Lets a unit of work keep running after the call that created it has
//! already returned its result.

use std::future::Future;
use std::pin::Pin;

/// Detached unit of work handed to an [`ExecutionContext`]
pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Host execution context
///
/// Implementations must not block the caller of [`wait_until`](Self::wait_until);
/// they only promise the task is allowed to run to completion (or until the
/// host's own lifecycle ends it).
pub trait ExecutionContext: Send + Sync {
    /// Register `task` to continue after the current call returns
    fn wait_until(&self, task: BackgroundTask);
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for std::sync::Arc<T> {
    fn wait_until(&self, task: BackgroundTask) {
        (**self).wait_until(task)
    }
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for &T {
    fn wait_until(&self, task: BackgroundTask) {
        (**self).wait_until(task)
    }
}
