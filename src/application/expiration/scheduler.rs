use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

/// Admits at most one run at a time; later attempts are turned away rather
/// than queued.
#[derive(Debug, Default)]
pub struct SingleFlight {
    running: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` if a run is already in flight
    pub fn try_acquire(&self) -> Option<SingleFlightGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SingleFlightGuard {
                running: &self.running,
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the slot when dropped, including on panic or cancellation
#[derive(Debug)]
pub struct SingleFlightGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for SingleFlightGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Runner for periodic tasks.
///
/// Each tick spawns the task instead of awaiting it, so a slow run never
/// delays the timer; overlap is the task's own concern. Ticks missed while
/// the runtime was busy are skipped, not replayed.
pub struct PeriodicTaskRunner {
    interval: Duration,
    task_name: String,
}

impl PeriodicTaskRunner {
    pub fn new(interval: Duration, task_name: impl Into<String>) -> Self {
        Self {
            interval,
            task_name: task_name.into(),
        }
    }

    /// Run the periodic task forever
    pub async fn run<F, Fut>(&self, task_fn: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        info!(
            task = %self.task_name,
            interval_secs = self.interval.as_secs(),
            "Starting periodic task"
        );

        let mut timer = time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            timer.tick().await;
            tokio::spawn(task_fn());
        }
    }
}
