//! Capability interface of the wrapped forwarding engine.
//!
//! The engine owns the pending-request table, the routing table and the
//! faces. The strategy only asks it to process packets that passed
//! inspection and to push alerts out of a face.

use thiserror::Error;
use crate::core::face::{Face, FaceId};
use crate::core::packet::{Name, Reply, Request};

/// Errors raised when the engine cannot put a reply on a face
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("{0} is down")]
    FaceDown(FaceId),
    #[error("{0} rejected the packet: {1}")]
    Rejected(FaceId, String),
}

/// What the engine did with a request it accepted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestReport {
    /// A new pending entry was created for the request
    pub pending_created: bool,
    /// Faces the request was sent out of
    pub forwarded_to: Vec<Face>,
}

#[cfg_attr(test, mockall::automock)]
pub trait ForwardingEngine {
    /// Make a newly attached face known to the engine
    fn add_face(&mut self, face: &Face);

    /// Capacity of the pending-request table
    fn max_table_size(&self) -> u32;

    /// Current number of pending entries
    fn table_size(&self) -> u32;

    /// Regular request pipeline: table lookup, aggregation, forwarding
    fn process_request(&mut self, in_face: &Face, request: &Request) -> RequestReport;

    /// Faces recorded on the pending entry a reply with this name would satisfy
    fn pending_faces(&self, name: &Name) -> Vec<Face>;

    /// Regular reply pipeline: satisfy and clear the matching pending entry
    fn process_reply(&mut self, in_face: &Face, reply: &Reply);

    /// Send a reply out of a single face
    fn send_reply(&mut self, face: &Face, reply: Reply) -> Result<(), EngineError>;
}
