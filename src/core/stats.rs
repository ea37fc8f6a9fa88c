//! Per-face statistics store.
//!
//! Each registered face owns one `FaceRecord` holding its satisfaction and
//! occupancy counters, its threshold pair and its alert timestamps. Records
//! are created together on registration and live as long as the store.
//! Only satisfaction counters are windowed; occupancy mirrors live table
//! state and thresholds only ever shrink.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use serde::Serialize;
use thiserror::Error;
use crate::core::face::{Face, FaceId, FaceKind};
use crate::utils::ratio;

/// Errors raised by store lookups
///
/// Both variants indicate a wiring bug in the host, not a runtime condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("{0} is not registered")]
    FaceNotFound(FaceId),
    #[error("{0} is already registered")]
    AlreadyRegistered(FaceId),
}

/// Forwarded requests against received replies within the current window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SatisfactionStats {
    pub requests_forwarded: u32,
    pub replies_received: u32,
    pub ratio: f64,
}

impl SatisfactionStats {
    fn record_forwarded(&mut self) {
        self.requests_forwarded = self.requests_forwarded.saturating_add(1);
        self.ratio = ratio(self.requests_forwarded, self.replies_received);
    }

    fn record_reply(&mut self) {
        self.replies_received = self.replies_received.saturating_add(1);
        self.ratio = ratio(self.requests_forwarded, self.replies_received);
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pending-table entries attributed to a face
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OccupancyStats {
    pub pending_entries: u32,
    pub ratio: f64,
}

impl OccupancyStats {
    fn increment(&mut self, max_table_size: u32) {
        self.pending_entries = self.pending_entries.saturating_add(1);
        self.ratio = ratio(self.pending_entries, max_table_size);
    }

    /// Returns false when the counter was already zero
    fn decrement(&mut self, max_table_size: u32) -> bool {
        let decremented = self.pending_entries > 0;
        if decremented {
            self.pending_entries -= 1;
        }
        self.ratio = ratio(self.pending_entries, max_table_size);
        decremented
    }
}

/// Satisfaction limit (ratio) and occupancy limit (entries)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPair {
    pub satisfaction_limit: f64,
    pub occupancy_limit: f64,
}

impl ThresholdPair {
    pub fn initial(omega: f64, rho: f64, max_table_size: u32) -> Self {
        Self {
            satisfaction_limit: omega,
            occupancy_limit: rho * max_table_size as f64,
        }
    }
}

/// Last alert sent out of, and last alert accepted from, a face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTimestamps {
    pub last_sent: Duration,
    pub last_accepted: Duration,
}

impl SignalTimestamps {
    fn at(now: Duration) -> Self {
        Self {
            last_sent: now,
            last_accepted: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MitigationState {
    Normal,
    Mitigating,
}

#[derive(Debug, Clone)]
pub struct FaceRecord {
    pub face: FaceId,
    pub kind: FaceKind,
    pub label: String,
    pub satisfaction: SatisfactionStats,
    pub occupancy: OccupancyStats,
    pub thresholds: ThresholdPair,
    pub timestamps: SignalTimestamps,
    pub state: MitigationState,
}

/// Serializable view of a face record
#[derive(Debug, Clone, Serialize)]
pub struct FaceReport {
    pub id: u64,
    pub label: String,
    pub kind: FaceKind,
    pub state: MitigationState,
    pub requests_forwarded: u32,
    pub replies_received: u32,
    pub satisfaction_ratio: f64,
    pub pending_entries: u32,
    pub occupancy_ratio: f64,
    pub satisfaction_limit: f64,
    pub occupancy_limit: f64,
    pub last_sent_ms: u128,
    pub last_accepted_ms: u128,
}

impl From<&FaceRecord> for FaceReport {
    fn from(record: &FaceRecord) -> Self {
        Self {
            id: record.face.0,
            label: record.label.clone(),
            kind: record.kind,
            state: record.state,
            requests_forwarded: record.satisfaction.requests_forwarded,
            replies_received: record.satisfaction.replies_received,
            satisfaction_ratio: record.satisfaction.ratio,
            pending_entries: record.occupancy.pending_entries,
            occupancy_ratio: record.occupancy.ratio,
            satisfaction_limit: record.thresholds.satisfaction_limit,
            occupancy_limit: record.thresholds.occupancy_limit,
            last_sent_ms: record.timestamps.last_sent.as_millis(),
            last_accepted_ms: record.timestamps.last_accepted.as_millis(),
        }
    }
}

/// Store shared between the strategy, its window timer and the admin API
pub type SharedStats = Arc<Mutex<FaceStatsStore>>;

/// Lock a shared store, recovering the data if a previous holder panicked
pub fn lock_stats(stats: &SharedStats) -> MutexGuard<'_, FaceStatsStore> {
    stats.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct FaceStatsStore {
    max_table_size: u32,
    records: HashMap<FaceId, FaceRecord>,
    pending_underflows: u64,
    window_resets: u64,
}

impl FaceStatsStore {
    pub fn new(max_table_size: u32) -> Self {
        Self {
            max_table_size,
            records: HashMap::new(),
            pending_underflows: 0,
            window_resets: 0,
        }
    }

    pub fn shared(max_table_size: u32) -> SharedStats {
        Arc::new(Mutex::new(Self::new(max_table_size)))
    }

    pub fn max_table_size(&self) -> u32 {
        self.max_table_size
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create all records for a face with zeroed counters
    pub fn register(&mut self, face: &Face, now: Duration, thresholds: ThresholdPair) -> Result<(), StatsError> {
        if self.records.contains_key(&face.id()) {
            return Err(StatsError::AlreadyRegistered(face.id()));
        }
        self.records.insert(
            face.id(),
            FaceRecord {
                face: face.id(),
                kind: face.kind(),
                label: face.label().to_string(),
                satisfaction: SatisfactionStats::default(),
                occupancy: OccupancyStats::default(),
                thresholds,
                timestamps: SignalTimestamps::at(now),
                state: MitigationState::Normal,
            },
        );
        Ok(())
    }

    pub fn record(&self, face: FaceId) -> Result<&FaceRecord, StatsError> {
        self.records.get(&face).ok_or(StatsError::FaceNotFound(face))
    }

    pub fn record_mut(&mut self, face: FaceId) -> Result<&mut FaceRecord, StatsError> {
        self.records.get_mut(&face).ok_or(StatsError::FaceNotFound(face))
    }

    pub fn record_forwarded(&mut self, face: FaceId) -> Result<SatisfactionStats, StatsError> {
        let record = self.record_mut(face)?;
        record.satisfaction.record_forwarded();
        Ok(record.satisfaction)
    }

    /// Count a satisfied pending entry. Returns false when the occupancy
    /// counter was already zero, i.e. the entry left the table unobserved.
    pub fn record_reply_matched(&mut self, face: FaceId) -> Result<bool, StatsError> {
        let max_table_size = self.max_table_size;
        let record = self.record_mut(face)?;
        record.satisfaction.record_reply();
        let decremented = record.occupancy.decrement(max_table_size);
        if !decremented {
            self.pending_underflows += 1;
        }
        Ok(decremented)
    }

    pub fn record_pending_created(&mut self, face: FaceId) -> Result<OccupancyStats, StatsError> {
        let max_table_size = self.max_table_size;
        let record = self.record_mut(face)?;
        record.occupancy.increment(max_table_size);
        Ok(record.occupancy)
    }

    /// Zero the satisfaction counters of every face
    pub fn window_reset(&mut self) {
        for record in self.records.values_mut() {
            record.satisfaction.reset();
        }
        self.window_resets += 1;
    }

    pub fn pending_underflows(&self) -> u64 {
        self.pending_underflows
    }

    pub fn window_resets(&self) -> u64 {
        self.window_resets
    }

    /// Reports for all faces, ordered by face id
    pub fn reports(&self) -> Vec<FaceReport> {
        let mut reports: Vec<FaceReport> = self.records.values().map(FaceReport::from).collect();
        reports.sort_by_key(|report| report.id);
        reports
    }
}
