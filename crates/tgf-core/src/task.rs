use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An owned background task: cancelled (and aborted) when stopped or dropped.
///
/// Every timer in the wizard (status poll, wait countdown, expiry redirect)
/// is one of these, so nothing outlives the session that started it.
#[derive(Debug)]
pub struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawn `f` on the current tokio runtime. The token handed to `f` fires
    /// on `stop()`/drop; long-running bodies should `select!` on it.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(f(cancel.clone()));
        Self { cancel, handle }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
        self.handle.abort(); // best-effort
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_task() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = ticks.clone();
        let task = ScheduledTask::spawn(move |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        t.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stop_marks_stopped() {
        let task = ScheduledTask::spawn(|cancel| async move { cancel.cancelled().await });
        assert!(!task.is_stopped());
        task.stop();
        assert!(task.is_stopped());
    }
}
