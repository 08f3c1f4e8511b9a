//! BackgroundTasks - tokio-backed execution context
//!
//! Host for detached work when the embedding application has no lifecycle
//! facility of its own. Tasks keep running after the registering call
//! returns; the owner may wait for them or abort them at shutdown.

use std::sync::Mutex;

use contracts::{BackgroundTask, ExecutionContext};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Supervised set of background tasks
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks registered and not yet reaped
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Wait until every registered task has finished
    ///
    /// Tasks registered while waiting are awaited as well. Panicked tasks are
    /// logged and do not stop the wait. The set stays behind the lock while
    /// waiting, so [`pending`](Self::pending) and [`abort_all`](Self::abort_all)
    /// keep seeing every task.
    pub async fn wait_idle(&self) {
        // The lock is held for one poll at a time, never across a suspension
        while let Some(joined) =
            std::future::poll_fn(|cx| self.lock().poll_join_next(cx)).await
        {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!(error = %e, "Background task panicked");
                } else {
                    debug!(error = %e, "Background task cancelled");
                }
            }
        }
    }

    /// Abort every registered task
    pub fn abort_all(&self) {
        let mut tasks = self.lock();
        if !tasks.is_empty() {
            warn!(tasks = tasks.len(), "Aborting background tasks");
        }
        tasks.abort_all();
        // Reap handles of already-finished tasks
        while tasks.try_join_next().is_some() {}
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ExecutionContext for BackgroundTasks {
    fn wait_until(&self, task: BackgroundTask) {
        let mut tasks = self.lock();
        // Drop results of finished tasks so the set does not grow unbounded
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!(error = %e, "Background task panicked");
                }
            }
        }
        tasks.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_idle_runs_registered_tasks() {
        let ctx = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            ctx.wait_until(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        ctx.wait_idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.pending(), 0);
    }

    async fn explode() {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stop_wait() {
        let ctx = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        ctx.wait_until(Box::pin(explode()));
        let flag = Arc::clone(&done);
        ctx.wait_until(Box::pin(async move {
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        ctx.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abort_all_cancels_pending() {
        let ctx = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&done);
        ctx.wait_until(Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ctx.pending(), 1);

        ctx.abort_all();
        ctx.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tasks_stay_visible_and_abortable_while_waiting() {
        let ctx = Arc::new(BackgroundTasks::new());
        let done = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&done);
        ctx.wait_until(Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        let waiter = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { ctx.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        assert_eq!(ctx.pending(), 1);

        ctx.abort_all();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("wait_idle did not observe the abort")
            .unwrap();
        assert_eq!(ctx.pending(), 0);
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }
}
