//! Minimum gap between alerts on a face, in each direction.
//!
//! Outbound and inbound alerts share `wait_time` but keep separate
//! timestamps, so sending never delays accepting and vice versa.

use std::time::Duration;
use crate::core::stats::SignalTimestamps;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceGate {
    wait_time: Duration,
}

impl DebounceGate {
    pub fn new(wait_time: Duration) -> Self {
        Self { wait_time }
    }

    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    pub fn can_send(&self, timestamps: &SignalTimestamps, now: Duration) -> bool {
        now.saturating_sub(timestamps.last_sent) > self.wait_time
    }

    pub fn on_sent(&self, timestamps: &mut SignalTimestamps, now: Duration) {
        timestamps.last_sent = now;
    }

    pub fn can_accept(&self, timestamps: &SignalTimestamps, now: Duration) -> bool {
        now.saturating_sub(timestamps.last_accepted) > self.wait_time
    }

    pub fn on_accepted(&self, timestamps: &mut SignalTimestamps, now: Duration) {
        timestamps.last_accepted = now;
    }
}
