//! Pushback alerts travel as ordinary replies under a reserved name.
//!
//! The scale factor is not carried; every node applies its own configured
//! value. A peer configured with a different alert name is never recognised.

use std::time::Duration;
use crate::core::packet::{Name, Reply};

/// Signature value stamped on every alert
pub const PUSHBACK_SIGNATURE: u32 = 12345;

#[derive(Debug, Clone, PartialEq)]
pub struct PushbackCodec {
    alert_name: Name,
}

impl PushbackCodec {
    pub fn new(alert_name: impl Into<Name>) -> Self {
        Self { alert_name: alert_name.into() }
    }

    pub fn alert_name(&self) -> &Name {
        &self.alert_name
    }

    pub fn build(&self) -> Reply {
        Reply {
            name: self.alert_name.clone(),
            payload: Vec::new(),
            signature: PUSHBACK_SIGNATURE,
            freshness: Duration::ZERO,
        }
    }

    pub fn is_pushback(&self, reply: &Reply) -> bool {
        reply.name == self.alert_name
    }
}
