//! Dispatch between adapters and the host
//!
//! Outbound: adapters push values with [`Registry::write`], which updates the
//! store and notifies the host. Inbound: the host delivers data to adapter
//! callbacks through [`Registry::read_call`] and [`Registry::connect_call`].
//! Unknown names are never an error for the caller's loop; they come back as
//! a [`Miss`](crate::error::Miss) and leave the registry untouched.

use serde_json::Value;
use tracing::{debug, trace};

use crate::callbacks::CallbackKind;
use crate::error::Lookup;
use crate::host::{HostMessage, WriteEvent};
use crate::id::NodeAddress;
use crate::object::NodeData;
use crate::registry::Registry;

impl Registry {
    /// Write a value with the default mode ("f"), no unit and a 0..1 range
    pub fn write(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        value: impl Into<Value>,
    ) -> Lookup {
        self.write_data(object_name, frame_name, node_name, NodeData::with_value(value))
    }

    /// Replace a node's data record and notify the host
    pub fn write_data(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        data: NodeData,
    ) -> Lookup {
        let object = self.lookup_object(object_name)?;
        let addr = NodeAddress::new(object, frame_name, node_name);
        self.write_at(&addr, data)
    }

    /// Write to an already resolved node
    pub fn write_at(&mut self, addr: &NodeAddress, data: NodeData) -> Lookup {
        let node = self.store.node_mut(addr)?;
        node.data = data;
        trace!(node = %addr.node, value = %node.data.value, "Node written");

        let data = &self.store.node(addr)?.data;
        self.host.on_write(WriteEvent {
            address: addr,
            data,
            store: &self.store,
            modules: &self.modules,
        });
        Ok(())
    }

    /// Deliver host data to the read callback of a node
    pub fn read_call(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        data: &Value,
    ) -> Lookup {
        let object = self.lookup_object(object_name)?;
        self.read_call_at(&NodeAddress::new(object, frame_name, node_name), data)
    }

    pub fn read_call_at(&mut self, addr: &NodeAddress, data: &Value) -> Lookup {
        self.callbacks.invoke(addr, CallbackKind::Read, data)
    }

    /// Deliver host data to the connection callback of a node
    pub fn connect_call(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        data: &Value,
    ) -> Lookup {
        let object = self.lookup_object(object_name)?;
        self.connect_call_at(&NodeAddress::new(object, frame_name, node_name), data)
    }

    pub fn connect_call_at(&mut self, addr: &NodeAddress, data: &Value) -> Lookup {
        let result = self.callbacks.invoke(addr, CallbackKind::Connection, data);
        match &result {
            Ok(()) => debug!(node = %addr.node, "Connection callback called"),
            Err(_) => debug!(node = %addr.node, "No connection callback"),
        }
        result
    }

    /// Announce a new connectable point to the host
    pub fn advertise_connection(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        logic: bool,
    ) -> Lookup {
        let object = self.lookup_object(object_name)?;
        let addr = NodeAddress::new(object, frame_name, node_name);
        self.host.emit(HostMessage::AdvertiseConnection {
            object: addr.object,
            frame: addr.frame,
            node: addr.node,
            logic,
            names: [object_name.to_string(), node_name.to_string()],
        });
        Ok(())
    }
}
