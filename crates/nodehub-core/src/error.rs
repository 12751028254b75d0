//! Lookup misses
//!
//! Registry operations never fail loudly on unknown names: a miss leaves the
//! registry untouched and is reported as a [`Miss`] so callers can log or
//! ignore it uniformly.

use thiserror::Error;

use crate::id::{FrameId, NodeId, ObjectId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    #[error("Object name did not resolve: {0}")]
    UnresolvedObject(String),
    #[error("Object not in store: {0}")]
    UnknownObject(ObjectId),
    #[error("Frame not in store: {0}")]
    UnknownFrame(FrameId),
    #[error("Node not in store: {0}")]
    UnknownNode(NodeId),
    #[error("No node named {name} in object {object}")]
    UnknownNodeName { object: ObjectId, name: String },
    #[error("No callback registered for node: {0}")]
    NoCallback(NodeId),
}

/// Result of a registry lookup
pub type Lookup<T = ()> = Result<T, Miss>;
