//! Telemetry emitted by the strategy.
//!
//! Two broadcast streams are exposed: occupancy samples after every request
//! that passed inspection, and mitigation events. Neither is read back by
//! the strategy. Counters go through the `metrics` facade.

use chrono::{DateTime, Utc};
use log::debug;
use metrics::{gauge, increment_counter};
use serde::Serialize;
use tokio::sync::broadcast::{self, Receiver, Sender};
use uuid::Uuid;
use crate::core::face::FaceId;
use crate::core::stats::FaceRecord;

pub const REQUESTS_DROPPED: &str = "poseidon_requests_dropped_total";
pub const PUSHBACKS_SENT: &str = "poseidon_pushbacks_sent_total";
pub const PUSHBACK_SEND_FAILURES: &str = "poseidon_pushback_send_failures_total";
pub const PUSHBACKS_ACCEPTED: &str = "poseidon_pushbacks_accepted_total";
pub const PUSHBACKS_IGNORED: &str = "poseidon_pushbacks_ignored_total";
pub const PENDING_UNDERFLOWS: &str = "poseidon_pending_underflows_total";
pub const WINDOW_RESETS: &str = "poseidon_window_resets_total";
pub const TABLE_OCCUPANCY: &str = "poseidon_table_occupancy_ratio";

const DEFAULT_CAPACITY: usize = 1024;

/// Global table occupancy after a request was processed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupancySample {
    pub occupancy_ratio: f64,
    pub table_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MitigationKind {
    /// Face crossed both thresholds
    MitigationStarted,
    /// Face dropped back below a threshold
    MitigationCleared,
    PushbackSent,
    PushbackAccepted,
    PushbackIgnored,
}

#[derive(Debug, Clone, Serialize)]
pub struct MitigationEvent {
    pub id: Uuid,
    pub face: FaceId,
    pub kind: MitigationKind,
    pub at: DateTime<Utc>,
    pub satisfaction_ratio: f64,
    pub pending_entries: u32,
    pub satisfaction_limit: f64,
    pub occupancy_limit: f64,
}

impl MitigationEvent {
    pub fn new(kind: MitigationKind, record: &FaceRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            face: record.face,
            kind,
            at: Utc::now(),
            satisfaction_ratio: record.satisfaction.ratio,
            pending_entries: record.occupancy.pending_entries,
            satisfaction_limit: record.thresholds.satisfaction_limit,
            occupancy_limit: record.thresholds.occupancy_limit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Telemetry {
    samples: Sender<OccupancySample>,
    events: Sender<MitigationEvent>,
}

impl Telemetry {
    pub fn new(capacity: usize) -> Self {
        let (samples, _) = broadcast::channel(capacity);
        let (events, _) = broadcast::channel(capacity);
        Self { samples, events }
    }

    pub fn subscribe_samples(&self) -> Receiver<OccupancySample> {
        self.samples.subscribe()
    }

    pub fn subscribe_events(&self) -> Receiver<MitigationEvent> {
        self.events.subscribe()
    }

    pub fn sample(&self, sample: OccupancySample) {
        gauge!(TABLE_OCCUPANCY, sample.occupancy_ratio);
        // no subscribers is not an error
        let _ = self.samples.send(sample);
    }

    pub fn event(&self, kind: MitigationKind, record: &FaceRecord) {
        debug!("{:?} on {}", kind, record.face);
        match kind {
            MitigationKind::PushbackSent => increment_counter!(PUSHBACKS_SENT),
            MitigationKind::PushbackAccepted => increment_counter!(PUSHBACKS_ACCEPTED),
            MitigationKind::PushbackIgnored => increment_counter!(PUSHBACKS_IGNORED),
            MitigationKind::MitigationStarted | MitigationKind::MitigationCleared => {}
        }
        let _ = self.events.send(MitigationEvent::new(kind, record));
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
