//! Core functionality of the pushback strategy.
//!
//! This module contains the per-face statistics store, the threshold policy,
//! the alert debounce gate and codec, and the strategy that ties them to a
//! forwarding engine.

pub mod clock;
pub mod debounce;
pub mod engine;
pub mod face;
pub mod packet;
pub mod pushback;
pub mod stats;
pub mod strategy;
pub mod telemetry;
pub mod threshold;
pub mod window;

pub use clock::{Clock, ManualClock, TokioClock};
pub use debounce::DebounceGate;
pub use engine::{EngineError, ForwardingEngine, RequestReport};
pub use face::{Face, FaceId, FaceKind};
pub use packet::{Name, Reply, Request};
pub use pushback::PushbackCodec;
pub use stats::{FaceRecord, FaceReport, FaceStatsStore, MitigationState, SharedStats, StatsError, ThresholdPair};
pub use strategy::{DropReason, PoseidonStrategy, ReplyDisposition, RequestDisposition, StrategyError};
pub use telemetry::{MitigationEvent, MitigationKind, OccupancySample, Telemetry};
pub use threshold::ThresholdPolicy;
pub use window::WindowTimer;
