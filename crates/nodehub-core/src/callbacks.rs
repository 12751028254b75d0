//! Callback registry: adapter callbacks keyed by node id
//!
//! Shaped like the object store (object → frame → node) but populated
//! independently of it, so an entry may outlive the node it was registered
//! for.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Lookup, Miss};
use crate::id::{FrameId, NodeAddress, NodeId, ObjectId};
use crate::registry::Registry;

/// Receives data the host delivers to a node
pub trait NodeCallback {
    fn call(&mut self, data: &Value);
}

impl<F> NodeCallback for F
where
    F: FnMut(&Value),
{
    fn call(&mut self, data: &Value) {
        self(data)
    }
}

/// Which callback slot of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Read,
    Connection,
}

/// Callbacks registered for one node
#[derive(Default)]
pub struct CallbackEntry {
    pub name: String,
    read: Option<Box<dyn NodeCallback>>,
    connection: Option<Box<dyn NodeCallback>>,
}

impl CallbackEntry {
    fn slot(&mut self, kind: CallbackKind) -> &mut Option<Box<dyn NodeCallback>> {
        match kind {
            CallbackKind::Read => &mut self.read,
            CallbackKind::Connection => &mut self.connection,
        }
    }

    pub fn has(&self, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::Read => self.read.is_some(),
            CallbackKind::Connection => self.connection.is_some(),
        }
    }
}

impl std::fmt::Debug for CallbackEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("name", &self.name)
            .field("read", &self.read.is_some())
            .field("connection", &self.connection.is_some())
            .finish()
    }
}

type CallbackFrame = BTreeMap<NodeId, CallbackEntry>;

#[derive(Debug, Default)]
pub struct CallbackRegistry {
    objects: BTreeMap<ObjectId, BTreeMap<FrameId, CallbackFrame>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a callback for a node, replacing any previous one of that kind
    pub fn set(
        &mut self,
        addr: &NodeAddress,
        node_name: &str,
        kind: CallbackKind,
        callback: Box<dyn NodeCallback>,
    ) {
        let entry = self
            .objects
            .entry(addr.object.clone())
            .or_default()
            .entry(addr.frame.clone())
            .or_default()
            .entry(addr.node.clone())
            .or_default();
        entry.name = node_name.to_string();
        *entry.slot(kind) = Some(callback);
    }

    pub fn entry(&self, addr: &NodeAddress) -> Option<&CallbackEntry> {
        self.objects
            .get(&addr.object)
            .and_then(|frames| frames.get(&addr.frame))
            .and_then(|nodes| nodes.get(&addr.node))
    }

    /// Drop every read callback registered under one frame. Connection
    /// callbacks stay; entries left with no callback are removed.
    ///
    /// Returns false if nothing was registered under the frame.
    pub fn remove_read_frame(&mut self, object: &ObjectId, frame: &FrameId) -> bool {
        let Some(frames) = self.objects.get_mut(object) else {
            return false;
        };
        let Some(nodes) = frames.get_mut(frame) else {
            return false;
        };
        nodes.retain(|_, entry| {
            entry.read = None;
            entry.connection.is_some()
        });
        if nodes.is_empty() {
            frames.remove(frame);
            if frames.is_empty() {
                self.objects.remove(object);
            }
        }
        true
    }

    /// Invoke the callback of the given kind, if one is registered
    pub fn invoke(&mut self, addr: &NodeAddress, kind: CallbackKind, data: &Value) -> Lookup {
        let callback = self
            .objects
            .get_mut(&addr.object)
            .and_then(|frames| frames.get_mut(&addr.frame))
            .and_then(|nodes| nodes.get_mut(&addr.node))
            .and_then(|entry| entry.slot(kind).as_mut())
            .ok_or_else(|| Miss::NoCallback(addr.node.clone()))?;
        callback.call(data);
        Ok(())
    }
}

impl Registry {
    /// Register the callback invoked when the host reads into a node
    pub fn add_read_listener(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        callback: impl NodeCallback + 'static,
    ) -> Lookup<NodeId> {
        self.add_listener(object_name, frame_name, node_name, CallbackKind::Read, Box::new(callback))
    }

    /// Register the callback invoked when the host connects to a node
    pub fn add_connection_listener(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        callback: impl NodeCallback + 'static,
    ) -> Lookup<NodeId> {
        self.add_listener(
            object_name,
            frame_name,
            node_name,
            CallbackKind::Connection,
            Box::new(callback),
        )
    }

    fn add_listener(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        kind: CallbackKind,
        callback: Box<dyn NodeCallback>,
    ) -> Lookup<NodeId> {
        let object = self.lookup_object(object_name)?;
        let addr = NodeAddress::new(object, frame_name, node_name);
        debug!(node = %addr.node, ?kind, "Registered listener");
        self.callbacks.set(&addr, node_name, kind, callback);
        Ok(addr.node)
    }

    /// Drop all read callbacks registered under a frame
    pub fn remove_read_listeners(&mut self, object_name: &str, frame_name: &str) -> Lookup {
        let object = self.lookup_object(object_name)?;
        let frame = FrameId::compose(&object, frame_name);
        if self.callbacks.remove_read_frame(&object, &frame) {
            debug!(frame = %frame, "Removed frame read listeners");
            Ok(())
        } else {
            Err(Miss::UnknownFrame(frame))
        }
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{lamp_registry, LAMP_ID};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<Value>>>, impl FnMut(&Value)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |data: &Value| sink.borrow_mut().push(data.clone()))
    }

    #[test]
    fn test_listener_does_not_require_stored_node() {
        let (mut registry, _host) = lamp_registry();
        let (_seen, cb) = recorder();
        let id = registry.add_read_listener("Lamp", "Main", "brightness", cb).unwrap();

        assert_eq!(id, NodeId::compose(&ObjectId::new(LAMP_ID), "Main", "brightness"));
        assert!(registry.store().is_empty());
        let addr = NodeAddress::new(ObjectId::new(LAMP_ID), "Main", "brightness");
        let entry = registry.callbacks().entry(&addr).unwrap();
        assert!(entry.has(CallbackKind::Read));
        assert!(!entry.has(CallbackKind::Connection));
    }

    #[test]
    fn test_listener_unresolved_object() {
        let (mut registry, _host) = lamp_registry();
        let (_seen, cb) = recorder();
        assert_eq!(
            registry.add_read_listener("Ghost", "Main", "x", cb),
            Err(Miss::UnresolvedObject("Ghost".to_string()))
        );
    }

    #[test]
    fn test_read_and_connection_share_entry() {
        let (mut registry, _host) = lamp_registry();
        let (reads, read_cb) = recorder();
        let (connects, connect_cb) = recorder();
        registry.add_read_listener("Lamp", "Main", "brightness", read_cb).unwrap();
        registry
            .add_connection_listener("Lamp", "Main", "brightness", connect_cb)
            .unwrap();

        let addr = NodeAddress::new(ObjectId::new(LAMP_ID), "Main", "brightness");
        registry
            .callbacks
            .invoke(&addr, CallbackKind::Connection, &json!({"linked": true}))
            .unwrap();

        assert!(reads.borrow().is_empty());
        assert_eq!(*connects.borrow(), vec![json!({"linked": true})]);
        let entry = registry.callbacks().entry(&addr).unwrap();
        assert!(entry.has(CallbackKind::Read) && entry.has(CallbackKind::Connection));
    }

    #[test]
    fn test_remove_read_listeners_clears_frame() {
        let (mut registry, _host) = lamp_registry();
        let (_a, cb_a) = recorder();
        let (_b, cb_b) = recorder();
        let (_c, cb_c) = recorder();
        registry.add_read_listener("Lamp", "Main", "a", cb_a).unwrap();
        registry.add_read_listener("Lamp", "Main", "b", cb_b).unwrap();
        registry.add_read_listener("Lamp", "Aux", "c", cb_c).unwrap();

        registry.remove_read_listeners("Lamp", "Main").unwrap();

        let object = ObjectId::new(LAMP_ID);
        assert!(registry.callbacks().entry(&NodeAddress::new(object.clone(), "Main", "a")).is_none());
        assert!(registry.callbacks().entry(&NodeAddress::new(object.clone(), "Main", "b")).is_none());
        assert!(registry.callbacks().entry(&NodeAddress::new(object, "Aux", "c")).is_some());
        assert!(registry.remove_read_listeners("Lamp", "Main").is_err());
        assert!(registry.remove_read_listeners("Ghost", "Main").is_err());
    }

    #[test]
    fn test_remove_read_listeners_keeps_connection_listeners() {
        let (mut registry, _host) = lamp_registry();
        let (reads, read_cb) = recorder();
        let (connects, connect_cb) = recorder();
        registry.add_read_listener("Lamp", "Main", "sw", read_cb).unwrap();
        registry.add_connection_listener("Lamp", "Main", "sw", connect_cb).unwrap();

        registry.remove_read_listeners("Lamp", "Main").unwrap();

        let sw = NodeId::compose(&ObjectId::new(LAMP_ID), "Main", "sw");
        assert_eq!(
            registry.read_call("Lamp", "Main", "sw", &json!(1)),
            Err(Miss::NoCallback(sw))
        );
        registry.connect_call("Lamp", "Main", "sw", &json!(2)).unwrap();
        assert!(reads.borrow().is_empty());
        assert_eq!(*connects.borrow(), vec![json!(2)]);

        let addr = NodeAddress::new(ObjectId::new(LAMP_ID), "Main", "sw");
        let entry = registry.callbacks().entry(&addr).unwrap();
        assert!(!entry.has(CallbackKind::Read) && entry.has(CallbackKind::Connection));

        registry.remove_read_listeners("Lamp", "Main").unwrap();
        assert!(registry.callbacks().entry(&addr).is_some());
    }
}
