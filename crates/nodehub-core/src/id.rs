//! Stable identifiers and the identifier resolver contract
//!
//! Objects are addressed by a stable id handed out by an external resolver.
//! Frame and node ids are composed from it by plain concatenation:
//!
//! - frame id = object id + frame name
//! - node id  = object id + frame name + node name
//!
//! Every registry operation uses this one scheme.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Stable identifier of a hardware object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a frame, unique within its object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    /// Compose a frame id from its object id and frame name
    pub fn compose(object: &ObjectId, frame_name: &str) -> Self {
        Self(format!("{}{}", object.0, frame_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a node, unique within its object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Compose a node id from its object id, frame name and node name
    pub fn compose(object: &ObjectId, frame_name: &str, node_name: &str) -> Self {
        Self(format!("{}{}{}", object.0, frame_name, node_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_display!(ObjectId, FrameId, NodeId);

/// Fully resolved address of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    pub object: ObjectId,
    pub frame: FrameId,
    pub node: NodeId,
}

impl NodeAddress {
    pub fn new(object: ObjectId, frame_name: &str, node_name: &str) -> Self {
        let frame = FrameId::compose(&object, frame_name);
        let node = NodeId::compose(&object, frame_name, node_name);
        Self { object, frame, node }
    }
}

/// Maps human-readable object names to stable object ids.
///
/// Two lookups exist: one by object name, and a target lookup that also
/// accepts an object id. Both may consult the object directory under
/// `base_dir`, and must agree on the id of any object name they both resolve.
pub trait IdResolver {
    /// Resolve an object name
    fn resolve_object_id(&self, name: &str, base_dir: &Path) -> Option<ObjectId>;

    /// Resolve an object name or id, consulting `base_dir` where supported
    fn resolve_target_id(&self, target: &str, base_dir: &Path) -> Option<ObjectId>;
}

/// Static name → id table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable {
    entries: BTreeMap<String, ObjectId>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the id for an object name
    pub fn insert(&mut self, name: impl Into<String>, id: ObjectId) {
        self.entries.insert(name.into(), id);
    }

    pub fn get(&self, name: &str) -> Option<&ObjectId> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains_id(&self, id: &str) -> bool {
        self.entries.values().any(|v| v.0 == id)
    }
}

impl<N: Into<String>> FromIterator<(N, ObjectId)> for LookupTable {
    fn from_iter<T: IntoIterator<Item = (N, ObjectId)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, id)| (n.into(), id)).collect(),
        }
    }
}

impl IdResolver for LookupTable {
    fn resolve_object_id(&self, name: &str, _base_dir: &Path) -> Option<ObjectId> {
        self.get(name).cloned()
    }

    fn resolve_target_id(&self, target: &str, _base_dir: &Path) -> Option<ObjectId> {
        if self.contains_id(target) {
            return Some(ObjectId::new(target));
        }
        self.get(target).cloned()
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid identity file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Identity file stored at `<base_dir>/<object>/.identity/object.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityFile {
    #[serde(rename = "objectId")]
    object_id: ObjectId,
}

/// Resolver backed by per-object identity files, falling back to a lookup table
#[derive(Debug, Clone, Default)]
pub struct DirectoryResolver {
    table: LookupTable,
}

impl DirectoryResolver {
    pub fn new(table: LookupTable) -> Self {
        Self { table }
    }

    /// Path of the identity file for an object folder
    pub fn identity_path(base_dir: &Path, object_name: &str) -> PathBuf {
        base_dir
            .join(object_name)
            .join(".identity")
            .join("object.json")
    }

    /// Read the object id from an identity file, `None` if the file is absent
    pub fn read_identity(
        base_dir: &Path,
        object_name: &str,
    ) -> Result<Option<ObjectId>, ResolveError> {
        let path = Self::identity_path(base_dir, object_name);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        let identity: IdentityFile =
            serde_json::from_str(&content).map_err(|source| ResolveError::Json { path, source })?;
        Ok(Some(identity.object_id))
    }

    fn identity_or_log(base_dir: &Path, object_name: &str) -> Option<ObjectId> {
        match Self::read_identity(base_dir, object_name) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                debug!(object = %object_name, "No identity file, falling back to lookup table");
                None
            }
            Err(e) => {
                warn!(object = %object_name, error = %e, "Failed to read identity file");
                None
            }
        }
    }
}

impl IdResolver for DirectoryResolver {
    fn resolve_object_id(&self, name: &str, base_dir: &Path) -> Option<ObjectId> {
        Self::identity_or_log(base_dir, name).or_else(|| self.table.resolve_object_id(name, base_dir))
    }

    fn resolve_target_id(&self, target: &str, base_dir: &Path) -> Option<ObjectId> {
        Self::identity_or_log(base_dir, target).or_else(|| self.table.resolve_target_id(target, base_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_id_composition() {
        let object = ObjectId::new("lampX7f2");
        assert_eq!(FrameId::compose(&object, "Main").as_str(), "lampX7f2Main");
        assert_eq!(
            NodeId::compose(&object, "Main", "brightness").as_str(),
            "lampX7f2Mainbrightness"
        );

        let addr = NodeAddress::new(object.clone(), "Main", "brightness");
        assert_eq!(addr.frame, FrameId::compose(&object, "Main"));
        assert_eq!(addr.node, NodeId::compose(&object, "Main", "brightness"));
    }

    #[test]
    fn test_lookup_table_resolves_names_and_ids() {
        let table: LookupTable = [("Lamp", ObjectId::new("lampX7f2"))].into_iter().collect();
        let dir = Path::new(".");

        assert_eq!(table.resolve_object_id("Lamp", dir), Some(ObjectId::new("lampX7f2")));
        assert_eq!(table.resolve_object_id("lampX7f2", dir), None);
        assert_eq!(
            table.resolve_target_id("lampX7f2", dir),
            Some(ObjectId::new("lampX7f2"))
        );
        assert_eq!(table.resolve_target_id("Lamp", dir), Some(ObjectId::new("lampX7f2")));
        assert_eq!(table.resolve_target_id("Fan", dir), None);
    }

    #[test]
    fn test_lookup_table_from_toml_shape() {
        let table: LookupTable =
            serde_json::from_str(r#"{"Lamp": "lampX7f2", "Fan": "fanQ91a"}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Fan"), Some(&ObjectId::new("fanQ91a")));
    }

    #[test]
    fn test_directory_resolver_prefers_identity_file() {
        let temp_dir = TempDir::new().unwrap();
        let identity = DirectoryResolver::identity_path(temp_dir.path(), "Lamp");
        std::fs::create_dir_all(identity.parent().unwrap()).unwrap();
        std::fs::write(&identity, r#"{"objectId": "lampFromDisk"}"#).unwrap();

        let table: LookupTable = [("Lamp", ObjectId::new("lampFromTable")), ("Fan", ObjectId::new("fanQ91a"))]
            .into_iter()
            .collect();
        let resolver = DirectoryResolver::new(table);

        assert_eq!(
            resolver.resolve_target_id("Lamp", temp_dir.path()),
            Some(ObjectId::new("lampFromDisk"))
        );
        assert_eq!(
            resolver.resolve_target_id("Fan", temp_dir.path()),
            Some(ObjectId::new("fanQ91a"))
        );
        assert_eq!(
            resolver.resolve_object_id("Lamp", temp_dir.path()),
            Some(ObjectId::new("lampFromDisk"))
        );
        assert_eq!(
            resolver.resolve_object_id("Fan", temp_dir.path()),
            Some(ObjectId::new("fanQ91a"))
        );
        assert_eq!(resolver.resolve_object_id("fanQ91a", temp_dir.path()), None);
    }

    #[test]
    fn test_directory_resolver_invalid_identity_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let identity = DirectoryResolver::identity_path(temp_dir.path(), "Lamp");
        std::fs::create_dir_all(identity.parent().unwrap()).unwrap();
        std::fs::write(&identity, "not json").unwrap();

        assert!(DirectoryResolver::read_identity(temp_dir.path(), "Lamp").is_err());

        let resolver = DirectoryResolver::new(LookupTable::new());
        assert_eq!(resolver.resolve_target_id("Lamp", temp_dir.path()), None);
        assert_eq!(resolver.resolve_object_id("Lamp", temp_dir.path()), None);
    }
}
