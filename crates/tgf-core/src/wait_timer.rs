//! Countdown gate honoring a remote rate-limit ("wait N seconds").

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::task::ScheduledTask;

const TICK: Duration = Duration::from_secs(1);

/// One step of the countdown: `n -> n - 1`, and `1 -> absent`.
pub fn tick(remaining: Option<u32>) -> Option<u32> {
    match remaining {
        Some(n) if n > 1 => Some(n - 1),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Countdown {
    /// Bumped on every arm/disarm so a superseded ticker can't touch a newer window.
    generation: u64,
    remaining: Option<u32>,
}

/// At most one countdown is active; arming replaces it.
#[derive(Debug, Default)]
pub struct WaitTimer {
    countdown: Arc<Mutex<Countdown>>,
    ticker: Mutex<Option<ScheduledTask>>,
}

impl WaitTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining seconds, or `None` when no window is active.
    pub fn remaining(&self) -> Option<u32> {
        lock(&self.countdown).remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining().is_some()
    }

    /// Start a fresh window of `seconds`. Zero disarms.
    pub fn arm(&self, seconds: u32) {
        if seconds == 0 {
            self.disarm();
            return;
        }

        let generation = {
            let mut cd = lock(&self.countdown);
            cd.generation += 1;
            cd.remaining = Some(seconds);
            cd.generation
        };

        let countdown = self.countdown.clone();
        let task = ScheduledTask::spawn(move |cancel| async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let mut cd = lock(&countdown);
                if cd.generation != generation {
                    break;
                }
                cd.remaining = tick(cd.remaining);
                if cd.remaining.is_none() {
                    break;
                }
            }
        });

        // Replacing drops (and stops) any previous ticker.
        *lock(&self.ticker) = Some(task);
        tracing::debug!(seconds, "wait window armed");
    }

    pub fn disarm(&self) {
        if let Some(task) = lock(&self.ticker).take() {
            task.stop();
        }
        let mut cd = lock(&self.countdown);
        cd.generation += 1;
        cd.remaining = None;
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_down_to_absent() {
        let mut r = Some(3);
        let mut seen = vec![];
        for _ in 0..3 {
            r = tick(r);
            seen.push(r);
        }
        assert_eq!(seen, vec![Some(2), Some(1), None]);
        assert_eq!(tick(None), None);
        assert_eq!(tick(Some(0)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn n_ticks_disarm() {
        let t = WaitTimer::new();
        t.arm(3);
        assert_eq!(t.remaining(), Some(3));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(t.remaining(), Some(2));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(t.remaining(), Some(1));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(t.remaining(), None);
        assert!(!t.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_is_immediate() {
        let t = WaitTimer::new();
        t.arm(30);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(t.remaining(), Some(28));
        t.disarm();
        assert_eq!(t.remaining(), None);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(t.remaining(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_previous_window() {
        let t = WaitTimer::new();
        t.arm(10);
        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(t.remaining(), Some(6));

        t.arm(2);
        assert_eq!(t.remaining(), Some(2));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(t.remaining(), Some(1));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(t.remaining(), None);
    }

    #[tokio::test]
    async fn arming_zero_disarms() {
        let t = WaitTimer::new();
        t.arm(5);
        t.arm(0);
        assert_eq!(t.remaining(), None);
    }
}
