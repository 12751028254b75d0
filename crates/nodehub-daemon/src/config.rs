//! Configuration loading and validation

use anyhow::{bail, Result};
use nodehub_core::{LookupTable, ModuleTables, ObjectId, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Object name → object id lookup table
    #[serde(default)]
    pub objects: LookupTable,
    #[serde(default)]
    pub modules: ModuleTables,
    #[serde(default, rename = "adapter")]
    pub adapters: Vec<AdapterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Adapter poll interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Lifecycle reset interval in seconds (0 to disable)
    #[serde(default)]
    pub reset_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            reset_interval_secs: 0,
        }
    }
}

fn default_tick_interval() -> u64 {
    100
}

/// A simulated hardware adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Adapter name, used in logs
    pub name: String,
    /// Object the adapter exposes nodes on
    pub object: String,
    /// Frame holding the nodes
    #[serde(default = "default_frame")]
    pub frame: String,
    #[serde(default, rename = "node")]
    pub nodes: Vec<SimNodeConfig>,
}

fn default_frame() -> String {
    "io".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimNodeConfig {
    pub name: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub waveform: Waveform,
    /// Waveform period in seconds
    #[serde(default = "default_period")]
    pub period_secs: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_min: f64,
    #[serde(default = "default_unit_max")]
    pub unit_max: f64,
}

fn default_node_type() -> String {
    nodehub_core::object::DEFAULT_NODE_TYPE.to_string()
}

fn default_period() -> f64 {
    10.0
}

fn default_unit_max() -> f64 {
    1.0
}

/// Signal a simulated node produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Ramp,
    Square,
    /// Echo back whatever the host delivers to the node
    Input,
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.daemon.tick_interval_ms == 0 {
            bail!("daemon.tick_interval_ms must be greater than zero");
        }
        for adapter in &self.adapters {
            for node in &adapter.nodes {
                if node.period_secs <= 0.0 {
                    bail!(
                        "adapter {} node {}: period_secs must be positive",
                        adapter.name,
                        node.name
                    );
                }
                if node.unit_max <= node.unit_min {
                    bail!(
                        "adapter {} node {}: unit_max must exceed unit_min",
                        adapter.name,
                        node.name
                    );
                }
            }
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        config
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

/// Save an example configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let mut objects = LookupTable::new();
    objects.insert("Lamp", ObjectId::new("lampX7f2a91c04d"));

    let config = Config {
        registry: RegistryConfig::default(),
        daemon: DaemonConfig::default(),
        objects,
        modules: ModuleTables::default(),
        adapters: vec![AdapterConfig {
            name: "lamp-sim".to_string(),
            object: "Lamp".to_string(),
            frame: default_frame(),
            nodes: vec![
                SimNodeConfig {
                    name: "brightness".to_string(),
                    node_type: default_node_type(),
                    waveform: Waveform::Sine,
                    period_secs: default_period(),
                    unit: None,
                    unit_min: 0.0,
                    unit_max: 1.0,
                },
                SimNodeConfig {
                    name: "switch".to_string(),
                    node_type: default_node_type(),
                    waveform: Waveform::Input,
                    period_secs: default_period(),
                    unit: None,
                    unit_min: 0.0,
                    unit_max: 1.0,
                },
            ],
        }],
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}
