//! Face handles.
//!
//! A face is owned by the forwarding engine; everything else holds clones of
//! the same `Arc`. Equality and hashing follow identity, never field values,
//! so two faces with the same label remain distinct keys.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde::{Deserialize, Serialize};

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}

/// What a face is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceKind {
    /// Link to an adjacent forwarder
    Network,
    /// Local application attachment; there is no upstream to signal
    Application,
}

#[derive(Debug)]
struct FaceInner {
    id: FaceId,
    kind: FaceKind,
    label: String,
}

/// Reference-counted face handle
#[derive(Debug, Clone)]
pub struct Face(Arc<FaceInner>);

impl Face {
    pub fn new(kind: FaceKind, label: impl Into<String>) -> Self {
        let id = FaceId(NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed));
        Self(Arc::new(FaceInner {
            id,
            kind,
            label: label.into(),
        }))
    }

    pub fn network(label: impl Into<String>) -> Self {
        Self::new(FaceKind::Network, label)
    }

    pub fn application(label: impl Into<String>) -> Self {
        Self::new(FaceKind::Application, label)
    }

    pub fn id(&self) -> FaceId {
        self.0.id
    }

    pub fn kind(&self) -> FaceKind {
        self.0.kind
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn is_local(&self) -> bool {
        self.0.kind == FaceKind::Application
    }
}

impl PartialEq for Face {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Face {}

impl Hash for Face {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.id, self.0.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_follows_identity() {
        let a = Face::network("eth0");
        let b = Face::network("eth0");
        let a2 = a.clone();

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());

        let set: HashSet<Face> = [a, a2, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn application_faces_are_local() {
        assert!(Face::application("consumer").is_local());
        assert!(!Face::network("eth1").is_local());
    }
}
