//! Poll scheduler
//!
//! Fires a job on a fixed interval, first tick immediately. At most one run
//! is in flight: a tick that arrives while the previous run is still going is
//! dropped, not queued.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

pub struct PollScheduler {
    period: Duration,
    in_progress: Arc<AtomicBool>,
}

/// Clears the in-progress flag when the run ends, including on panic.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PollScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs `job` on every tick until the returned future is dropped.
    pub async fn run<F, Fut>(self, job: F)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if self.in_progress.swap(true, Ordering::AcqRel) {
                debug!("Previous poll still running, skipping tick");
                continue;
            }

            let guard = RunGuard(self.in_progress.clone());
            let run = job();
            tokio::spawn(async move {
                let _guard = guard;
                if let Err(e) = run.await {
                    error!("Poll cycle failed: {:#}", e);
                }
            });
        }
    }
}
