//! Registry configuration supplied by the host at wiring time

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Verbose registry diagnostics
    #[serde(default)]
    pub debug: bool,
    /// Developer UI enabled for every object
    #[serde(default)]
    pub developer: bool,
    /// Directory holding one folder per object, used for id resolution
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            debug: false,
            developer: false,
            base_dir: default_base_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./objects")
}
