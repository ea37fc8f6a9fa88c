//! Breach detection and threshold decay.

use crate::core::stats::{FaceRecord, ThresholdPair};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    scale: f64,
}

impl ThresholdPolicy {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Both the satisfaction ratio and the pending entries must strictly
    /// exceed their limits; either one alone never flags a face.
    pub fn is_anomalous(&self, record: &FaceRecord) -> bool {
        record.satisfaction.ratio > record.thresholds.satisfaction_limit
            && record.occupancy.pending_entries as f64 > record.thresholds.occupancy_limit
    }

    /// Shrink both limits geometrically. There is no floor.
    pub fn scale_down(&self, thresholds: &mut ThresholdPair) {
        thresholds.satisfaction_limit *= self.scale;
        thresholds.occupancy_limit *= self.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::core::face::Face;
    use crate::core::stats::FaceStatsStore;

    const MAX_TABLE: u32 = 100;

    fn record_with(forwarded: u32, replies: u32, pending: u32) -> FaceRecord {
        let face = Face::network("eth0");
        let mut store = FaceStatsStore::new(MAX_TABLE);
        store
            .register(&face, Duration::ZERO, ThresholdPair::initial(3.0, 0.125, MAX_TABLE))
            .unwrap();
        // replies decrement pending, so create enough entries up front
        for _ in 0..(pending + replies) {
            store.record_pending_created(face.id()).unwrap();
        }
        for _ in 0..forwarded {
            store.record_forwarded(face.id()).unwrap();
        }
        for _ in 0..replies {
            store.record_reply_matched(face.id()).unwrap();
        }
        store.record(face.id()).unwrap().clone()
    }

    #[test]
    fn joint_breach_is_anomalous() {
        let record = record_with(10, 2, 20);
        assert_eq!(record.satisfaction.ratio, 5.0);
        assert_eq!(record.occupancy.ratio, 0.2);
        assert_eq!(record.thresholds.occupancy_limit, 12.5);
        assert!(ThresholdPolicy::new(0.5).is_anomalous(&record));
    }

    #[test]
    fn low_occupancy_is_never_anomalous() {
        let policy = ThresholdPolicy::new(0.5);
        assert!(!policy.is_anomalous(&record_with(10, 2, 5)));
        assert!(!policy.is_anomalous(&record_with(1000, 1, 12)));
    }

    #[test]
    fn low_satisfaction_ratio_is_never_anomalous() {
        let policy = ThresholdPolicy::new(0.5);
        // ratio exactly at the limit does not count
        assert!(!policy.is_anomalous(&record_with(6, 2, 90)));
        assert!(!policy.is_anomalous(&record_with(1, 1, 98)));
        // no replies at all: ratio is defined as zero
        assert!(!policy.is_anomalous(&record_with(80, 0, 80)));
    }

    #[test]
    fn scale_down_compounds() {
        let policy = ThresholdPolicy::new(0.5);
        let mut thresholds = ThresholdPair::initial(3.0, 0.125, MAX_TABLE);

        for n in 1..=6 {
            policy.scale_down(&mut thresholds);
            let factor = 0.5f64.powi(n);
            assert!((thresholds.satisfaction_limit - 3.0 * factor).abs() < 1e-12);
            assert!((thresholds.occupancy_limit - 12.5 * factor).abs() < 1e-12);
        }
    }

    #[test]
    fn two_acceptances_quarter_omega() {
        let policy = ThresholdPolicy::new(0.5);
        let mut thresholds = ThresholdPair::initial(3.0, 0.125, MAX_TABLE);
        policy.scale_down(&mut thresholds);
        policy.scale_down(&mut thresholds);
        assert_eq!(thresholds.satisfaction_limit, 0.75);
    }
}
