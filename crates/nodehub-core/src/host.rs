//! Host-side contract: write notifications and outbound messages

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::id::{FrameId, NodeAddress, NodeId, ObjectId};
use crate::object::{NodeData, ObjectStore};

/// Names of the node type modules and block modules the host has loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTables {
    #[serde(default)]
    pub node_types: BTreeSet<String>,
    #[serde(default)]
    pub blocks: BTreeSet<String>,
}

/// A node value was written by an adapter
#[derive(Debug, Clone, Copy)]
pub struct WriteEvent<'a> {
    pub address: &'a NodeAddress,
    pub data: &'a NodeData,
    /// The whole store, after the write
    pub store: &'a ObjectStore,
    pub modules: &'a ModuleTables,
}

/// The reset sweep finished; reset hooks run next
#[derive(Debug, Clone, Copy)]
pub struct ResetEvent<'a> {
    /// The whole store, after the sweep
    pub store: &'a ObjectStore,
    /// Number of adapter-owned nodes re-advertised by the sweep
    pub readvertised: usize,
}

/// Message sent from the registry to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostMessage {
    /// A new connectable point is available
    AdvertiseConnection {
        object: ObjectId,
        frame: FrameId,
        node: NodeId,
        logic: bool,
        /// Object name and node name, for display
        names: [String; 2],
    },
    /// The UI for an object (or one of its frames) must be reloaded
    ReloadObject {
        object: ObjectId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame: Option<FrameId>,
    },
}

/// The host engine the registry reports to
pub trait Host {
    /// Called after a node's data changed, so the host can route it onward
    fn on_write(&mut self, event: WriteEvent<'_>);

    /// Deliver an outbound message
    fn emit(&mut self, message: HostMessage);

    /// Ask the host to persist an object
    fn persist(&mut self, object: &ObjectId);

    /// Called between the reset sweep and the reset hooks
    fn on_reset(&mut self, _event: ResetEvent<'_>) {}
}
