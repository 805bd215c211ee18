use std::{sync::Arc, time::Duration};

use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;

use crate::{
    api::{port::ForwarderApi, types::RunStatus},
    task::ScheduledTask,
};

/// Background poll of the remote run state.
///
/// Fixed cadence, no backoff: a failed tick publishes the degraded snapshot
/// from the adapter and the next tick runs on schedule. The first query fires
/// immediately on start.
pub struct StatusPoller {
    api: Arc<dyn ForwarderApi>,
    status: Arc<watch::Sender<RunStatus>>,
    refresh: Arc<Notify>,
    task: ScheduledTask,
}

impl StatusPoller {
    pub fn start(api: Arc<dyn ForwarderApi>, every: Duration) -> Self {
        let (tx, _rx) = watch::channel(RunStatus::default());
        let status = Arc::new(tx);
        let refresh = Arc::new(Notify::new());

        let task = {
            let api = api.clone();
            let status = status.clone();
            let refresh = refresh.clone();
            ScheduledTask::spawn(move |cancel| async move {
                let mut ticker = tokio::time::interval(every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                        _ = refresh.notified() => {}
                    }
                    let snapshot = tokio::select! {
                        _ = cancel.cancelled() => break,
                        s = api.query_status() => s,
                    };
                    tracing::trace!(
                        running = snapshot.is_running,
                        connected = snapshot.is_connected,
                        "status polled"
                    );
                    status.send_replace(snapshot);
                }
            })
        };

        Self {
            api,
            status,
            refresh,
            task,
        }
    }

    /// Latest snapshot (default until the first poll lands).
    pub fn current(&self) -> RunStatus {
        self.status.borrow().clone()
    }

    /// Ask the loop for an out-of-schedule poll.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Query right now and publish the result, bypassing the loop.
    pub async fn poll_now(&self) -> RunStatus {
        let snapshot = self.api.query_status().await;
        self.status.send_replace(snapshot.clone());
        snapshot
    }

    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::types::ApiOutcome,
        domain::SessionBlob,
        model::{credentials::Credentials, forwarding::ForwardingConfig},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingApi {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl ForwarderApi for CountingApi {
        async fn upload_session(&self, _blob: &SessionBlob) -> ApiOutcome {
            unreachable!()
        }
        async fn request_code(&self, _c: &Credentials) -> ApiOutcome {
            unreachable!()
        }
        async fn verify_code(&self, _c: &Credentials) -> ApiOutcome {
            unreachable!()
        }
        async fn start_forwarding(&self, _c: &Credentials, _f: &ForwardingConfig) -> ApiOutcome {
            unreachable!()
        }
        async fn stop_forwarding(&self) -> ApiOutcome {
            unreachable!()
        }
        async fn query_status(&self) -> RunStatus {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n % 2 == 0 {
                RunStatus::unavailable()
            } else {
                RunStatus {
                    is_running: true,
                    is_connected: true,
                    last_message: format!("poll {n}"),
                    ..RunStatus::default()
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_cadence() {
        let api = Arc::new(CountingApi::default());
        let poller = StatusPoller::start(api.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.current().last_message, "poll 1");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 2);
        // Failed tick degrades, next one proceeds as usual.
        assert!(!poller.current().is_connected);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
        assert!(poller.current().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_polling() {
        let api = Arc::new(CountingApi::default());
        let poller = StatusPoller::start(api.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.stop();
        assert!(poller.is_stopped());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_request_polls_early() {
        let api = Arc::new(CountingApi::default());
        let poller = StatusPoller::start(api.clone(), Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(10)).await;

        poller.request_refresh();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.polls.load(Ordering::SeqCst), 2);
    }
}
