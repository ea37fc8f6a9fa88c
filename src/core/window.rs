//! Periodic reset of windowed statistics.

use std::time::Duration;
use log::{debug, info};
use metrics::increment_counter;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use crate::core::stats::{lock_stats, SharedStats};
use crate::core::telemetry::WINDOW_RESETS;

/// Reset the satisfaction counters of every face in the store
pub fn reset_window(stats: &SharedStats) {
    let mut store = lock_stats(stats);
    store.window_reset();
    increment_counter!(WINDOW_RESETS);
    debug!("Statistics window reset for {} faces", store.len());
}

/// Repeating window reset running on the tokio runtime
///
/// The first reset happens one full window after spawning. Dropping the
/// timer cancels it.
#[derive(Debug)]
pub struct WindowTimer {
    handle: Option<JoinHandle<()>>,
    window: Duration,
}

impl WindowTimer {
    /// Spawn the timer; must be called from within a tokio runtime
    pub fn spawn(stats: SharedStats, window: Duration) -> Self {
        info!("Starting statistics window timer ({:?})", window);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + window, window);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                reset_window(&stats);
            }
        });
        Self {
            handle: Some(handle),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Stop the timer; repeated calls are no-ops
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Statistics window timer stopped");
        }
    }
}

impl Drop for WindowTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
