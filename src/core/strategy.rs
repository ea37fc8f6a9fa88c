//! Flood detection and pushback mitigation wrapped around a forwarding engine.
//!
//! The strategy sees every lifecycle event of the engine it wraps. Requests
//! arriving on a face whose satisfaction ratio and pending entries both
//! exceed that face's limits are dropped before the engine sees them; when
//! collaboration is enabled an alert is sent back to the offending neighbour,
//! at most once per `wait_time`. An accepted alert shrinks the limits of the
//! face it came from.
//!
//! All handlers run to completion on the caller's thread. The only
//! background activity is the window timer started by [`PoseidonStrategy::start`].

use std::fmt;
use std::time::Duration;
use log::{debug, error, info, warn};
use metrics::increment_counter;
use thiserror::Error;
use crate::core::clock::Clock;
use crate::core::debounce::DebounceGate;
use crate::core::engine::{EngineError, ForwardingEngine};
use crate::core::face::Face;
use crate::core::packet::{Reply, Request};
use crate::core::pushback::PushbackCodec;
use crate::core::stats::{lock_stats, FaceStatsStore, MitigationState, SharedStats, StatsError, ThresholdPair};
use crate::core::telemetry::{MitigationKind, OccupancySample, Telemetry, PENDING_UNDERFLOWS, PUSHBACK_SEND_FAILURES, REQUESTS_DROPPED};
use crate::core::threshold::ThresholdPolicy;
use crate::core::window::{reset_window, WindowTimer};
use crate::models::StrategyConfig;

/// Errors that can occur while constructing or driving the strategy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The host invoked a handler for a face it never registered.
    /// Hosts must treat this as fatal.
    #[error("Contract violation: {0}")]
    ContractViolation(#[from] StatsError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Pending-request table has no size limit")]
    UnboundedTable,
}

/// Why a request was not handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// An alert was sent back out of the arrival face
    PushbackSent,
    /// The alert could not be sent; the request is dropped regardless
    PushbackFailed(EngineError),
    /// An alert went out less than `wait_time` ago
    Debounced,
    /// The request came from a local application
    LocalFace,
    /// Collaboration is disabled
    Silent,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::PushbackSent => "pushback_sent",
            DropReason::PushbackFailed(_) => "pushback_failed",
            DropReason::Debounced => "debounced",
            DropReason::LocalFace => "local_face",
            DropReason::Silent => "silent",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`PoseidonStrategy::on_request_received`]
#[derive(Debug, Clone, PartialEq)]
pub enum RequestDisposition {
    /// Handed to the engine, which sent it out of this many faces
    Forwarded { out_faces: usize },
    Dropped(DropReason),
}

/// Outcome of [`PoseidonStrategy::on_reply_received`]
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyDisposition {
    /// Regular reply handed to the engine after crediting this many faces
    Delivered { matched_faces: usize },
    PushbackAccepted,
    /// Alert arrived less than `wait_time` after the previous accepted one
    PushbackIgnored,
}

pub struct PoseidonStrategy<E, C> {
    engine: E,
    clock: C,
    config: StrategyConfig,
    stats: SharedStats,
    policy: ThresholdPolicy,
    gate: DebounceGate,
    codec: PushbackCodec,
    telemetry: Telemetry,
    window: Option<WindowTimer>,
}

impl<E: ForwardingEngine, C: Clock> PoseidonStrategy<E, C> {
    /// Wrap `engine`. The table size limit is read once, here.
    pub fn new(engine: E, clock: C, config: StrategyConfig) -> Result<Self, StrategyError> {
        config.validate().map_err(StrategyError::InvalidConfig)?;
        let max_table_size = engine.max_table_size();
        if max_table_size == 0 {
            return Err(StrategyError::UnboundedTable);
        }

        info!(
            "Pushback strategy ready: omega={} rho={} scale={} distributed={} table={}",
            config.omega, config.rho, config.scale, config.distributed, max_table_size
        );

        Ok(Self {
            engine,
            clock,
            stats: FaceStatsStore::shared(max_table_size),
            policy: ThresholdPolicy::new(config.scale),
            gate: DebounceGate::new(config.wait_time()),
            codec: PushbackCodec::new(config.alert_name.as_str()),
            telemetry: Telemetry::default(),
            window: None,
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Handle on the statistics store, for reporting
    pub fn stats(&self) -> SharedStats {
        self.stats.clone()
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Start the window timer; a no-op if it is already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.window.is_none() {
            self.window = Some(WindowTimer::spawn(self.stats.clone(), self.config.window()));
        }
    }

    /// Stop the window timer; repeated calls are no-ops
    pub fn stop(&mut self) {
        if let Some(mut timer) = self.window.take() {
            timer.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.window.as_ref().map_or(false, WindowTimer::is_running)
    }

    pub fn on_face_added(&mut self, face: &Face) -> Result<(), StrategyError> {
        let now = self.clock.now();
        let thresholds = {
            let mut store = lock_stats(&self.stats);
            let thresholds = ThresholdPair::initial(self.config.omega, self.config.rho, store.max_table_size());
            match store.register(face, now, thresholds) {
                Ok(()) => thresholds,
                Err(StatsError::AlreadyRegistered(id)) => {
                    warn!("{} registered twice, keeping existing statistics", id);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        };

        self.engine.add_face(face);
        info!(
            "Setting thresholds on {}: satisfaction {} occupancy {}",
            face, thresholds.satisfaction_limit, thresholds.occupancy_limit
        );
        Ok(())
    }

    pub fn on_request_received(&mut self, in_face: &Face, request: &Request) -> Result<RequestDisposition, StrategyError> {
        let now = self.clock.now();
        let anomalous = {
            let mut store = lock_stats(&self.stats);
            let record = store.record_mut(in_face.id()).map_err(|e| self.violation(e))?;
            debug!(
                "{}: ratio {} limit {}, pending {} limit {}",
                in_face,
                record.satisfaction.ratio,
                record.thresholds.satisfaction_limit,
                record.occupancy.pending_entries,
                record.thresholds.occupancy_limit
            );

            let anomalous = self.policy.is_anomalous(record);
            let next = if anomalous { MitigationState::Mitigating } else { MitigationState::Normal };
            if record.state != next {
                record.state = next;
                let kind = if anomalous {
                    info!("Mitigation started on {}", in_face);
                    MitigationKind::MitigationStarted
                } else {
                    info!("Mitigation cleared on {}", in_face);
                    MitigationKind::MitigationCleared
                };
                self.telemetry.event(kind, record);
            }
            anomalous
        };

        if anomalous {
            let reason = self.mitigate(in_face, now)?;
            increment_counter!(REQUESTS_DROPPED, "reason" => reason.as_str());
            debug!("Dropping {} from {}: {}", request.name, in_face, reason);
            return Ok(RequestDisposition::Dropped(reason));
        }

        let report = self.engine.process_request(in_face, request);
        if report.pending_created {
            self.on_pending_entry_created(in_face, request)?;
        }
        for out_face in &report.forwarded_to {
            self.on_request_forwarded(in_face, out_face, request)?;
        }

        let table_size = self.engine.table_size();
        let max_table_size = lock_stats(&self.stats).max_table_size();
        self.telemetry.sample(OccupancySample {
            occupancy_ratio: table_size as f64 / max_table_size as f64,
            table_size,
        });

        Ok(RequestDisposition::Forwarded { out_faces: report.forwarded_to.len() })
    }

    /// Decide how an anomalous request is dropped, sending an alert if allowed
    fn mitigate(&mut self, in_face: &Face, now: Duration) -> Result<DropReason, StrategyError> {
        if !self.config.distributed {
            return Ok(DropReason::Silent);
        }

        let can_send = {
            let store = lock_stats(&self.stats);
            let record = store.record(in_face.id()).map_err(|e| self.violation(e))?;
            self.gate.can_send(&record.timestamps, now)
        };
        if !can_send {
            info!("Dropping request on {}, alert already sent", in_face);
            return Ok(DropReason::Debounced);
        }
        if in_face.is_local() {
            debug!("{} is a local application, dropping without alert", in_face);
            return Ok(DropReason::LocalFace);
        }

        match self.engine.send_reply(in_face, self.codec.build()) {
            Ok(()) => {
                let mut store = lock_stats(&self.stats);
                let record = store.record_mut(in_face.id()).map_err(|e| self.violation(e))?;
                self.gate.on_sent(&mut record.timestamps, now);
                info!("Emitted pushback alert on {}", in_face);
                self.telemetry.event(MitigationKind::PushbackSent, record);
                Ok(DropReason::PushbackSent)
            }
            Err(e) => {
                warn!("Could not send pushback alert on {}: {}", in_face, e);
                increment_counter!(PUSHBACK_SEND_FAILURES);
                Ok(DropReason::PushbackFailed(e))
            }
        }
    }

    /// Credit a forwarded request to the face it arrived on
    pub fn on_request_forwarded(&mut self, in_face: &Face, out_face: &Face, request: &Request) -> Result<(), StrategyError> {
        let satisfaction = lock_stats(&self.stats)
            .record_forwarded(in_face.id())
            .map_err(|e| self.violation(e))?;
        debug!(
            "{} forwarded to {} from {}: {} forwarded, {} replies, ratio {}",
            request.name, out_face.id(), in_face, satisfaction.requests_forwarded, satisfaction.replies_received, satisfaction.ratio
        );
        Ok(())
    }

    pub fn on_pending_entry_created(&mut self, in_face: &Face, request: &Request) -> Result<(), StrategyError> {
        let occupancy = lock_stats(&self.stats)
            .record_pending_created(in_face.id())
            .map_err(|e| self.violation(e))?;
        debug!(
            "Pending entry for {} on {}: {} entries, ratio {}",
            request.name, in_face, occupancy.pending_entries, occupancy.ratio
        );
        Ok(())
    }

    pub fn on_reply_received(&mut self, in_face: &Face, reply: &Reply) -> Result<ReplyDisposition, StrategyError> {
        if self.config.distributed && self.codec.is_pushback(reply) {
            return self.accept_pushback(in_face);
        }

        let faces = self.engine.pending_faces(&reply.name);
        {
            let mut store = lock_stats(&self.stats);
            // resolve every face before touching any counter
            for face in &faces {
                store.record(face.id()).map_err(|e| self.violation(e))?;
            }
            for face in &faces {
                let decremented = store.record_reply_matched(face.id()).map_err(|e| self.violation(e))?;
                if !decremented {
                    increment_counter!(PENDING_UNDERFLOWS);
                    debug!("Pending entries on {} already at zero", face);
                }
            }
        }

        self.engine.process_reply(in_face, reply);
        Ok(ReplyDisposition::Delivered { matched_faces: faces.len() })
    }

    fn accept_pushback(&mut self, in_face: &Face) -> Result<ReplyDisposition, StrategyError> {
        let now = self.clock.now();
        let mut store = lock_stats(&self.stats);
        let record = store.record_mut(in_face.id()).map_err(|e| self.violation(e))?;

        if !self.gate.can_accept(&record.timestamps, now) {
            warn!("Pushback refused on {}, too close to the previous one", in_face);
            self.telemetry.event(MitigationKind::PushbackIgnored, record);
            return Ok(ReplyDisposition::PushbackIgnored);
        }

        self.policy.scale_down(&mut record.thresholds);
        self.gate.on_accepted(&mut record.timestamps, now);
        info!(
            "Pushback accepted on {}: satisfaction limit {} occupancy limit {}",
            in_face, record.thresholds.satisfaction_limit, record.thresholds.occupancy_limit
        );
        self.telemetry.event(MitigationKind::PushbackAccepted, record);
        Ok(ReplyDisposition::PushbackAccepted)
    }

    /// Reset windowed statistics now, for hosts that drive their own scheduler
    pub fn on_window_tick(&mut self) {
        reset_window(&self.stats);
    }

    fn violation(&self, e: StatsError) -> StrategyError {
        error!("Lifecycle wiring error: {}", e);
        StrategyError::ContractViolation(e)
    }
}
