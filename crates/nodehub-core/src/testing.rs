//! Shared fixtures for unit tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{Host, HostMessage, ResetEvent, WriteEvent};
use crate::id::{LookupTable, NodeAddress, ObjectId};
use crate::object::NodeData;
use crate::registry::{Registry, Wiring};

pub const LAMP_ID: &str = "lampX7f2";
pub const FAN_ID: &str = "fanQ91a";

#[derive(Debug, Default)]
struct HostLog {
    writes: Vec<(NodeAddress, NodeData)>,
    messages: Vec<HostMessage>,
    persisted: Vec<ObjectId>,
    /// (nodes re-advertised, nodes in store) per reset sweep
    resets: Vec<(usize, usize)>,
}

/// Host that records everything it is told
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Rc<RefCell<HostLog>>,
}

impl RecordingHost {
    pub fn writes(&self) -> Vec<(NodeAddress, NodeData)> {
        self.log.borrow().writes.clone()
    }

    pub fn messages(&self) -> Vec<HostMessage> {
        self.log.borrow().messages.clone()
    }

    pub fn persisted(&self) -> Vec<ObjectId> {
        self.log.borrow().persisted.clone()
    }

    pub fn resets(&self) -> Vec<(usize, usize)> {
        self.log.borrow().resets.clone()
    }
}

impl Host for RecordingHost {
    fn on_write(&mut self, event: WriteEvent<'_>) {
        assert!(event.store.node(event.address).is_ok());
        self.log
            .borrow_mut()
            .writes
            .push((event.address.clone(), event.data.clone()));
    }

    fn emit(&mut self, message: HostMessage) {
        self.log.borrow_mut().messages.push(message);
    }

    fn persist(&mut self, object: &ObjectId) {
        self.log.borrow_mut().persisted.push(object.clone());
    }

    fn on_reset(&mut self, event: ResetEvent<'_>) {
        let stored: usize = event.store.objects().map(|o| o.nodes().count()).sum();
        self.log.borrow_mut().resets.push((event.readvertised, stored));
    }
}

/// Registry resolving "Lamp" and "Fan", plus a handle on its host
pub fn lamp_registry() -> (Registry, RecordingHost) {
    let table: LookupTable = [
        ("Lamp", ObjectId::new(LAMP_ID)),
        ("Fan", ObjectId::new(FAN_ID)),
    ]
    .into_iter()
    .collect();
    let host = RecordingHost::default();
    let registry = Registry::new(Wiring::new(Box::new(table), Box::new(host.clone())));
    (registry, host)
}
