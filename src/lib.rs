//! Interest flooding detection and pushback mitigation.
//!
//! A [`core::PoseidonStrategy`] wraps a forwarding engine and watches, per
//! incoming face, the balance between forwarded requests and returned replies
//! together with that face's share of the pending-request table. Faces that
//! exceed both limits have their requests dropped, and neighbours can be asked
//! to tighten their own limits through pushback alerts.

pub mod api;
pub mod config;
pub mod core;
pub mod models;
pub mod utils;
