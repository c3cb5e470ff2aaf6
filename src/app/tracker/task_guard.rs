// Scoped background tasks

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::trace;

/// Owns a spawned tokio task and aborts it when dropped.
///
/// The tracker keeps these in its state, so replacing or clearing the slot is
/// enough to stop the task; nothing can outlive the job that started it.
pub(crate) struct TaskGuard {
    label: &'static str,
    handle: JoinHandle<()>,
}

impl TaskGuard {
    pub(crate) fn spawn<F>(label: &'static str, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            label,
            handle: tokio::spawn(task),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            trace!(task = self.label, "Aborting background task");
            self.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let guard = TaskGuard::spawn("test", async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(true, Ordering::SeqCst);
        });

        drop(guard);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_task_reports_finished() {
        let guard = TaskGuard::spawn("test", async {});
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(guard.is_finished());
    }
}
