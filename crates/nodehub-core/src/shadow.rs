//! Shadow advertisement table
//!
//! Records which nodes adapters advertised during the current pass. A pass
//! ends when the registry prunes a scope against the table, which also drains
//! that scope so the next pass starts empty.

use std::collections::BTreeMap;

use crate::id::{FrameId, NodeId, ObjectId};

/// A node advertised during the current pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowEntry {
    pub name: String,
    pub node_type: String,
}

type ShadowFrame = BTreeMap<NodeId, ShadowEntry>;

#[derive(Debug, Clone, Default)]
pub struct ShadowTable {
    objects: BTreeMap<ObjectId, BTreeMap<FrameId, ShadowFrame>>,
}

impl ShadowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an advertised node
    pub fn advertise(
        &mut self,
        object: &ObjectId,
        frame: &FrameId,
        node: &NodeId,
        name: &str,
        node_type: &str,
    ) {
        self.objects
            .entry(object.clone())
            .or_default()
            .entry(frame.clone())
            .or_default()
            .insert(
                node.clone(),
                ShadowEntry {
                    name: name.to_string(),
                    node_type: node_type.to_string(),
                },
            );
    }

    pub fn is_advertised(&self, object: &ObjectId, frame: &FrameId, node: &NodeId) -> bool {
        self.objects
            .get(object)
            .and_then(|frames| frames.get(frame))
            .is_some_and(|nodes| nodes.contains_key(node))
    }

    /// Node ids advertised for one frame of an object
    pub fn advertised(&self, object: &ObjectId, frame: &FrameId) -> Vec<NodeId> {
        self.objects
            .get(object)
            .and_then(|frames| frames.get(frame))
            .map(|nodes| nodes.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove and return the entries of one frame
    pub fn take_frame(&mut self, object: &ObjectId, frame: &FrameId) -> ShadowFrame {
        let Some(frames) = self.objects.get_mut(object) else {
            return ShadowFrame::new();
        };
        let taken = frames.remove(frame).unwrap_or_default();
        if frames.is_empty() {
            self.objects.remove(object);
        }
        taken
    }

    /// Remove and return the entries of every frame of an object
    pub fn take_object(&mut self, object: &ObjectId) -> BTreeMap<FrameId, ShadowFrame> {
        self.objects.remove(object).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertise_and_take() {
        let object = ObjectId::new("lampX7f2");
        let main = FrameId::compose(&object, "Main");
        let aux = FrameId::compose(&object, "Aux");
        let a = NodeId::compose(&object, "Main", "a");
        let b = NodeId::compose(&object, "Aux", "b");

        let mut shadow = ShadowTable::new();
        shadow.advertise(&object, &main, &a, "a", "default");
        shadow.advertise(&object, &main, &a, "a", "default");
        shadow.advertise(&object, &aux, &b, "b", "default");

        assert!(shadow.is_advertised(&object, &main, &a));
        assert!(!shadow.is_advertised(&object, &main, &b));
        assert_eq!(shadow.advertised(&object, &main), vec![a.clone()]);

        let taken = shadow.take_frame(&object, &main);
        assert_eq!(taken.len(), 1);
        assert!(!shadow.is_advertised(&object, &main, &a));
        assert!(shadow.is_advertised(&object, &aux, &b));

        let rest = shadow.take_object(&object);
        assert_eq!(rest.len(), 1);
        assert!(shadow.is_empty());
    }

    #[test]
    fn test_take_unknown_scope_is_empty() {
        let object = ObjectId::new("lampX7f2");
        let mut shadow = ShadowTable::new();
        assert!(shadow.take_frame(&object, &FrameId::compose(&object, "Main")).is_empty());
        assert!(shadow.take_object(&object).is_empty());
    }
}
