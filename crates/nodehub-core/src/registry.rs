//! The node registry: object store, shadow table and node management
//!
//! Adapters advertise nodes with [`Registry::add_node`] and finish each pass
//! with [`Registry::clear_object`], which removes every adapter-owned node
//! they did not re-advertise.

use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::callbacks::CallbackRegistry;
use crate::config::RegistryConfig;
use crate::error::{Lookup, Miss};
use crate::host::{Host, HostMessage, ModuleTables};
use crate::id::{FrameId, IdResolver, NodeAddress, NodeId, ObjectId};
use crate::lifecycle::Hooks;
use crate::object::{Frame, Link, Node, ObjectStore};
use crate::shadow::ShadowTable;

/// Half-width of the square in which new nodes are placed
const PLACEMENT_SPREAD: i32 = 100;

/// Everything the host hands to the registry at startup
pub struct Wiring {
    pub config: RegistryConfig,
    pub resolver: Box<dyn IdResolver>,
    pub host: Box<dyn Host>,
    pub modules: ModuleTables,
    /// Initial store contents, e.g. objects restored by the host
    pub store: ObjectStore,
}

impl Wiring {
    pub fn new(resolver: Box<dyn IdResolver>, host: Box<dyn Host>) -> Self {
        Self {
            config: RegistryConfig::default(),
            resolver,
            host,
            modules: ModuleTables::default(),
            store: ObjectStore::new(),
        }
    }
}

/// Registry holding all objects, callbacks and lifecycle hooks of a process
pub struct Registry {
    pub(crate) config: RegistryConfig,
    pub(crate) resolver: Box<dyn IdResolver>,
    pub(crate) host: Box<dyn Host>,
    pub(crate) modules: ModuleTables,
    pub(crate) store: ObjectStore,
    pub(crate) shadow: ShadowTable,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) hooks: Hooks,
}

impl Registry {
    /// Wire up a registry. Called once by the host.
    pub fn new(wiring: Wiring) -> Self {
        info!(
            objects = wiring.store.len(),
            base_dir = %wiring.config.base_dir.display(),
            "Registry wired"
        );
        Self {
            config: wiring.config,
            resolver: wiring.resolver,
            host: wiring.host,
            modules: wiring.modules,
            store: wiring.store,
            shadow: ShadowTable::new(),
            callbacks: CallbackRegistry::new(),
            hooks: Hooks::new(),
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn shadow(&self) -> &ShadowTable {
        &self.shadow
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn modules(&self) -> &ModuleTables {
        &self.modules
    }

    /// Whether debug diagnostics are enabled
    pub fn get_debug(&self) -> bool {
        self.config.debug
    }

    /// Resolve an object name
    pub(crate) fn lookup_object(&self, object_name: &str) -> Lookup<ObjectId> {
        self.resolver
            .resolve_object_id(object_name, &self.config.base_dir)
            .ok_or_else(|| Miss::UnresolvedObject(object_name.to_string()))
    }

    /// Resolve an object name or id against the object directory
    pub(crate) fn resolve_target(&self, target: &str) -> Lookup<ObjectId> {
        self.resolver
            .resolve_target_id(target, &self.config.base_dir)
            .ok_or_else(|| Miss::UnresolvedObject(target.to_string()))
    }

    /// Object id for an object name, if it resolves
    pub fn get_object_id_from_object_name(&self, object_name: &str) -> Option<ObjectId> {
        self.resolve_target(object_name).ok()
    }

    /// Advertise a node, creating it (and its frame and object) if needed.
    ///
    /// Repeating the call with the same arguments leaves the node unchanged:
    /// the random placement is only chosen when the node is first created.
    pub fn add_node(
        &mut self,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        node_type: &str,
    ) -> Lookup<NodeId> {
        let object = self.resolve_target(object_name).map_err(|miss| {
            debug!(object = %object_name, "add_node: object unresolved");
            miss
        })?;
        Ok(self.add_node_at(&object, object_name, frame_name, node_name, node_type))
    }

    pub(crate) fn add_node_at(
        &mut self,
        object_id: &ObjectId,
        object_name: &str,
        frame_name: &str,
        node_name: &str,
        node_type: &str,
    ) -> NodeId {
        let addr = NodeAddress::new(object_id.clone(), frame_name, node_name);
        let developer = self.config.developer;

        let object = self.store.object_or_insert(object_id, object_name);
        object.developer = developer;
        object.name = object_name.to_string();

        let frame = object
            .frames
            .entry(addr.frame.clone())
            .or_insert_with(|| Frame::new(addr.frame.clone(), frame_name));
        frame.name = frame_name.to_string();

        let node = frame.nodes.entry(addr.node.clone()).or_insert_with(|| {
            let mut rng = rand::thread_rng();
            let mut node = Node::new(addr.node.clone(), node_name, node_type);
            node.x = f64::from(rng.gen_range(-PLACEMENT_SPREAD..=PLACEMENT_SPREAD));
            node.y = f64::from(rng.gen_range(-PLACEMENT_SPREAD..=PLACEMENT_SPREAD));
            debug!(node = %addr.node, x = node.x, y = node.y, "Created node");
            node
        });
        node.name = node_name.to_string();
        node.node_type = node_type.to_string();
        node.text = None;

        self.shadow
            .advertise(&addr.object, &addr.frame, &addr.node, node_name, node_type);
        addr.node
    }

    /// Remove every adapter-owned node of a frame (or of all frames when
    /// `frame_name` is `None`) that was not advertised since the last prune.
    ///
    /// Returns the ids of the removed nodes. Links are left untouched.
    pub fn clear_object(
        &mut self,
        object_name: &str,
        frame_name: Option<&str>,
    ) -> Lookup<Vec<NodeId>> {
        let object = self.resolve_target(object_name)?;
        let frame = frame_name.map(|name| FrameId::compose(&object, name));
        Ok(self.prune(&object, frame.as_ref()))
    }

    pub(crate) fn prune(&mut self, object_id: &ObjectId, frame: Option<&FrameId>) -> Vec<NodeId> {
        let advertised: BTreeMap<FrameId, Vec<NodeId>> = match frame {
            Some(frame) => {
                let nodes = self.shadow.take_frame(object_id, frame);
                BTreeMap::from([(frame.clone(), nodes.into_keys().collect())])
            }
            None => self
                .shadow
                .take_object(object_id)
                .into_iter()
                .map(|(frame, nodes)| (frame, nodes.into_keys().collect()))
                .collect(),
        };

        let Ok(object) = self.store.object_mut(object_id) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        for (frame_id, stored) in object.frames.iter_mut() {
            if frame.is_some_and(|f| f != frame_id) {
                continue;
            }
            let keep = advertised.get(frame_id);
            stored.nodes.retain(|node_id, node| {
                let stays = !node.is_adapter_owned()
                    || keep.is_some_and(|ids| ids.contains(node_id));
                if !stays {
                    debug!(object = %object_id, frame = %frame_id, node = %node_id, "Pruning node");
                    removed.push(node_id.clone());
                }
                stays
            });
        }

        debug!(object = %object_id, removed = removed.len(), "Object cleared");
        removed
    }

    /// Remove the node with the given name from every frame of an object
    pub fn remove_node(&mut self, object_name: &str, node_name: &str) -> Lookup<Vec<NodeId>> {
        let object_id = self.resolve_target(object_name)?;
        let object = self.store.object_mut(&object_id)?;

        let mut removed = Vec::new();
        for frame in object.frames.values_mut() {
            let node_id = NodeId::compose(&object_id, &frame.name, node_name);
            if frame.nodes.remove(&node_id).is_some() {
                debug!(node = %node_id, "Removed node");
                removed.push(node_id);
            }
        }

        if removed.is_empty() {
            return Err(Miss::UnknownNodeName {
                object: object_id,
                name: node_name.to_string(),
            });
        }
        Ok(removed)
    }

    /// Remove every node of an object, returning how many were removed
    pub fn remove_all_nodes(&mut self, object_name: &str) -> Lookup<usize> {
        let object_id = self.resolve_target(object_name)?;
        let object = self.store.object_mut(&object_id)?;

        let mut count = 0;
        for frame in object.frames.values_mut() {
            count += frame.nodes.len();
            frame.nodes.clear();
        }
        debug!(object = %object_id, count, "Removed all nodes");
        Ok(count)
    }

    /// Give a node new display text, keeping its id, and ask the host to reload
    pub fn rename_node(
        &mut self,
        object_name: &str,
        frame_name: &str,
        old_node_name: &str,
        new_node_name: &str,
    ) -> Lookup {
        let object_id = self.resolve_target(object_name)?;
        let addr = NodeAddress::new(object_id, frame_name, old_node_name);

        let renamed = self.store.node_mut(&addr).map(|node| {
            node.text = Some(new_node_name.to_string());
        });

        self.host.emit(HostMessage::ReloadObject {
            object: addr.object.clone(),
            frame: Some(addr.frame.clone()),
        });
        renamed
    }

    /// Update the stored layout of the named node in every frame of an object
    pub fn move_node(&mut self, object_name: &str, node_name: &str, x: f64, y: f64) -> Lookup {
        let object_id = self.resolve_target(object_name)?;
        let object = self.store.object_mut(&object_id)?;

        let mut moved = false;
        for frame in object.frames.values_mut() {
            let node_id = NodeId::compose(&object_id, &frame.name, node_name);
            if let Some(node) = frame.nodes.get_mut(&node_id) {
                node.x = x;
                node.y = y;
                moved = true;
                debug!(node = %node_id, x, y, "Moved node");
            }
        }

        if moved {
            Ok(())
        } else {
            Err(Miss::UnknownNodeName {
                object: object_id,
                name: node_name.to_string(),
            })
        }
    }

    /// Snapshot of every node of an object, empty if the object is unknown
    pub fn get_all_nodes(&self, object_name: &str) -> BTreeMap<NodeId, Node> {
        self.resolve_target(object_name)
            .and_then(|id| self.store.object(&id).map(|object| {
                object
                    .nodes()
                    .map(|node| (node.id.clone(), node.clone()))
                    .collect()
            }))
            .unwrap_or_default()
    }

    /// Snapshot of every link of an object, empty if the object is unknown
    pub fn get_all_links_to_nodes(&self, object_name: &str) -> BTreeMap<String, Link> {
        self.resolve_target(object_name)
            .and_then(|id| self.store.object(&id).map(|object| {
                object
                    .frames
                    .values()
                    .flat_map(|frame| frame.links.iter())
                    .map(|(id, link)| (id.clone(), link.clone()))
                    .collect()
            }))
            .unwrap_or_default()
    }

    pub fn activate(&mut self, object_name: &str) -> Lookup {
        self.set_deactivated(object_name, false)
    }

    pub fn deactivate(&mut self, object_name: &str) -> Lookup {
        self.set_deactivated(object_name, true)
    }

    fn set_deactivated(&mut self, object_name: &str, deactivated: bool) -> Lookup {
        let object_id = self.resolve_target(object_name)?;
        self.store.object_mut(&object_id)?.deactivated = deactivated;
        info!(object = %object_id, deactivated, "Object activation changed");
        Ok(())
    }

    /// Ask the host to reload an object's UI and persist it
    pub fn reload_node_ui(&mut self, object_name: &str) -> Lookup {
        let object_id = self.resolve_target(object_name)?;
        self.host.emit(HostMessage::ReloadObject {
            object: object_id.clone(),
            frame: None,
        });
        self.host.persist(&object_id);
        Ok(())
    }

    /// Turn the developer UI on or off for every object
    pub fn enable_developer_ui(&mut self, developer: bool) {
        self.config.developer = developer;
        for object in self.store.objects_mut() {
            object.developer = developer;
        }
        info!(developer, "Developer UI toggled");
    }
}
