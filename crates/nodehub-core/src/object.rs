//! Object store: hardware objects, their frames and nodes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Lookup, Miss};
use crate::id::{FrameId, NodeAddress, NodeId, ObjectId};

/// Node type whose nodes belong to the logic engine, never to an adapter
pub const LOGIC_NODE_TYPE: &str = "logic";

/// Default node type for plain hardware I/O points
pub const DEFAULT_NODE_TYPE: &str = "default";

/// Size assigned to a node on first creation
pub const DEFAULT_NODE_SIZE: f64 = 100.0;

/// Value payload carried by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// The value itself, typically a number
    pub value: Value,
    /// Adapter-defined datatype tag, "f" for floating point
    pub mode: String,
    /// Unit label, if the value carries one
    pub unit: Option<String>,
    /// Lower bound of the value range
    pub unit_min: f64,
    /// Upper bound of the value range
    pub unit_max: f64,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            value: Value::from(0),
            mode: "f".to_string(),
            unit: None,
            unit_min: 0.0,
            unit_max: 1.0,
        }
    }
}

impl NodeData {
    /// Data record with the default mode, unit and range
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// An addressable I/O point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Adapter-defined type tag, e.g. "default" or "logic"
    #[serde(rename = "type")]
    pub node_type: String,
    pub x: f64,
    pub y: f64,
    pub frame_size_x: f64,
    pub frame_size_y: f64,
    pub data: NodeData,
    /// Display text overriding `name` after a rename
    pub text: Option<String>,
    /// Node belongs to its frame rather than to a hardware adapter
    #[serde(rename = "frame")]
    pub frame_bound: bool,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            node_type: node_type.into(),
            x: 0.0,
            y: 0.0,
            frame_size_x: DEFAULT_NODE_SIZE,
            frame_size_y: DEFAULT_NODE_SIZE,
            data: NodeData::default(),
            text: None,
            frame_bound: false,
        }
    }

    /// Name shown to users, honoring a pending rename
    pub fn display_name(&self) -> &str {
        self.text.as_deref().unwrap_or(&self.name)
    }

    /// Whether the node is managed by a hardware adapter
    pub fn is_adapter_owned(&self) -> bool {
        self.node_type != LOGIC_NODE_TYPE && !self.frame_bound
    }
}

/// Routing relationship between nodes. Stored and exposed, never evaluated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(pub Value);

/// Scope of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameLocation {
    /// Node names are exposed to the hardware interface
    Local,
    Global,
}

impl Default for FrameLocation {
    fn default() -> Self {
        Self::Local
    }
}

/// A named sub-unit of an object holding placement state and nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Unconstrained 4x4 placement, empty until first positioned
    pub matrix: Vec<f64>,
    pub visible: bool,
    pub visible_text: bool,
    pub visible_editing: bool,
    pub location: FrameLocation,
    pub src: String,
    pub nodes: BTreeMap<NodeId, Node>,
    pub links: BTreeMap<String, Link>,
}

impl Frame {
    pub fn new(id: FrameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            matrix: Vec::new(),
            visible: false,
            visible_text: false,
            visible_editing: false,
            location: FrameLocation::Local,
            src: "editor".to_string(),
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }
}

/// A logical device exposing frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareObject {
    pub id: ObjectId,
    pub name: String,
    pub deactivated: bool,
    pub developer: bool,
    pub frames: BTreeMap<FrameId, Frame>,
}

impl HardwareObject {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            deactivated: false,
            developer: false,
            frames: BTreeMap::new(),
        }
    }

    /// Iterate over every node of every frame
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.frames.values().flat_map(|f| f.nodes.values())
    }
}

/// The object → frame → node hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectStore {
    objects: BTreeMap<ObjectId, HardwareObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Insert an object, replacing any object with the same id
    pub fn insert(&mut self, object: HardwareObject) {
        self.objects.insert(object.id.clone(), object);
    }

    pub fn object(&self, id: &ObjectId) -> Lookup<&HardwareObject> {
        self.objects
            .get(id)
            .ok_or_else(|| Miss::UnknownObject(id.clone()))
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Lookup<&mut HardwareObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| Miss::UnknownObject(id.clone()))
    }

    /// Get an object, creating it if absent
    pub fn object_or_insert(&mut self, id: &ObjectId, name: &str) -> &mut HardwareObject {
        self.objects
            .entry(id.clone())
            .or_insert_with(|| HardwareObject::new(id.clone(), name))
    }

    pub fn frame(&self, object: &ObjectId, frame: &FrameId) -> Lookup<&Frame> {
        self.object(object)?
            .frames
            .get(frame)
            .ok_or_else(|| Miss::UnknownFrame(frame.clone()))
    }

    pub fn frame_mut(&mut self, object: &ObjectId, frame: &FrameId) -> Lookup<&mut Frame> {
        self.object_mut(object)?
            .frames
            .get_mut(frame)
            .ok_or_else(|| Miss::UnknownFrame(frame.clone()))
    }

    pub fn node(&self, addr: &NodeAddress) -> Lookup<&Node> {
        self.frame(&addr.object, &addr.frame)?
            .nodes
            .get(&addr.node)
            .ok_or_else(|| Miss::UnknownNode(addr.node.clone()))
    }

    pub fn node_mut(&mut self, addr: &NodeAddress) -> Lookup<&mut Node> {
        self.frame_mut(&addr.object, &addr.frame)?
            .nodes
            .get_mut(&addr.node)
            .ok_or_else(|| Miss::UnknownNode(addr.node.clone()))
    }

    pub fn objects(&self) -> impl Iterator<Item = &HardwareObject> {
        self.objects.values()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut HardwareObject> {
        self.objects.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults() {
        let object = ObjectId::new("lampX7f2");
        let node = Node::new(NodeId::compose(&object, "Main", "brightness"), "brightness", "default");
        assert_eq!(node.frame_size_x, DEFAULT_NODE_SIZE);
        assert_eq!(node.frame_size_y, DEFAULT_NODE_SIZE);
        assert_eq!(node.data.mode, "f");
        assert_eq!(node.data.unit_max, 1.0);
        assert!(node.is_adapter_owned());
        assert_eq!(node.display_name(), "brightness");
    }

    #[test]
    fn test_logic_and_frame_bound_nodes_are_not_adapter_owned() {
        let object = ObjectId::new("lampX7f2");
        let mut node = Node::new(NodeId::compose(&object, "Main", "gate"), "gate", LOGIC_NODE_TYPE);
        assert!(!node.is_adapter_owned());

        node.node_type = DEFAULT_NODE_TYPE.to_string();
        node.frame_bound = true;
        assert!(!node.is_adapter_owned());
    }

    #[test]
    fn test_store_lookup_misses() {
        let mut store = ObjectStore::new();
        let object = ObjectId::new("lampX7f2");
        let addr = NodeAddress::new(object.clone(), "Main", "brightness");

        assert_eq!(store.node(&addr), Err(Miss::UnknownObject(object.clone())));

        store.object_or_insert(&object, "Lamp");
        assert_eq!(store.node(&addr), Err(Miss::UnknownFrame(addr.frame.clone())));

        store
            .object_mut(&object)
            .unwrap()
            .frames
            .insert(addr.frame.clone(), Frame::new(addr.frame.clone(), "Main"));
        assert_eq!(store.node(&addr), Err(Miss::UnknownNode(addr.node.clone())));
    }

    #[test]
    fn test_node_serializes_with_wire_names() {
        let object = ObjectId::new("lampX7f2");
        let node = Node::new(NodeId::compose(&object, "Main", "brightness"), "brightness", "default");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "default");
        assert_eq!(json["frameSizeX"], 100.0);
        assert_eq!(json["data"]["unitMin"], 0.0);
        assert_eq!(json["frame"], false);
    }
}
