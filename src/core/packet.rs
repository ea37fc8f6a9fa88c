//! Minimal request/reply packet model.
//!
//! Only the fields the strategy reads or stamps are represented; encoding is
//! left to the forwarding engine.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Hierarchical name compared component by component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name(Vec<String>);

impl Name {
    pub fn components(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Name {
    type Err = std::convert::Infallible;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        Ok(Name::from(uri))
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Self {
        Name(
            uri.split('/')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for component in &self.0 {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// Request (interest) for named content
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub name: Name,
    pub nonce: u32,
}

impl Request {
    pub fn new(name: impl Into<Name>, nonce: u32) -> Self {
        Self { name: name.into(), nonce }
    }
}

/// Reply (data) carrying named content
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub name: Name,
    pub payload: Vec<u8>,
    pub signature: u32,
    pub freshness: Duration,
}

impl Reply {
    pub fn new(name: impl Into<Name>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
            signature: 0,
            freshness: Duration::ZERO,
        }
    }
}
