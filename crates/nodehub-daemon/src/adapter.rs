//! Hardware adapters driven by the daemon
//!
//! An adapter advertises its nodes, polls its hardware on every tick and
//! pushes values into the registry. The built-in [`SimulatedAdapter`]
//! produces waveforms and echoes host input, standing in for real hardware.

use nodehub_core::{map, EventKind, HookError, NodeData, Registry};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AdapterConfig, SimNodeConfig, Waveform};

/// A hardware interface module
pub trait Adapter {
    fn name(&self) -> &str;

    /// Advertise nodes and register callbacks and lifecycle hooks
    fn start(&mut self, registry: &mut Registry);

    /// Poll the hardware and push fresh values
    fn tick(&mut self, registry: &mut Registry, elapsed: Duration);
}

/// Adapter producing configured waveforms on its nodes
pub struct SimulatedAdapter {
    config: AdapterConfig,
    /// Set by the reset hook; the next tick re-advertises all nodes
    readvertise: Rc<Cell<bool>>,
    /// Host input received through read callbacks, per input node
    inbox: Rc<RefCell<VecDeque<(String, Value)>>>,
    running: Rc<Cell<bool>>,
}

impl SimulatedAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            readvertise: Rc::new(Cell::new(false)),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            running: Rc::new(Cell::new(false)),
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// One advertise-then-prune pass over the configured nodes
    fn advertise(&self, registry: &mut Registry) {
        let object = &self.config.object;
        let frame = &self.config.frame;
        for node in &self.config.nodes {
            if let Err(miss) = registry.add_node(object, frame, &node.name, &node.node_type) {
                warn!(adapter = %self.config.name, error = %miss, "Failed to advertise node");
                return;
            }
        }
        match registry.clear_object(object, Some(frame)) {
            Ok(removed) if !removed.is_empty() => {
                info!(adapter = %self.config.name, removed = removed.len(), "Pruned stale nodes");
            }
            Ok(_) => {}
            Err(miss) => debug!(adapter = %self.config.name, error = %miss, "Prune skipped"),
        }
    }

    fn register_callbacks(&self, registry: &mut Registry) {
        let object = &self.config.object;
        let frame = &self.config.frame;
        for node in self.config.nodes.iter().filter(|n| n.waveform == Waveform::Input) {
            let inbox = self.inbox.clone();
            let name = node.name.clone();
            let registered = registry.add_read_listener(object, frame, &node.name, move |data: &Value| {
                inbox.borrow_mut().push_back((name.clone(), data.clone()));
            });
            if let Err(miss) = registered {
                warn!(adapter = %self.config.name, error = %miss, "Failed to register read listener");
                continue;
            }

            let adapter = self.config.name.clone();
            let name = node.name.clone();
            let connected = registry.add_connection_listener(object, frame, &node.name, move |data: &Value| {
                info!(adapter = %adapter, node = %name, data = %data, "Node connected");
            });
            if let Err(miss) = connected {
                debug!(adapter = %self.config.name, error = %miss, "Connection listener skipped");
            }
            if let Err(miss) = registry.advertise_connection(object, frame, &node.name, false) {
                debug!(adapter = %self.config.name, error = %miss, "Connection not advertised");
            }
        }

        let readvertise = self.readvertise.clone();
        registry.add_event_listener(EventKind::Reset, move || -> Result<(), HookError> {
            readvertise.set(true);
            Ok(())
        });

        let running = self.running.clone();
        let adapter = self.config.name.clone();
        registry.add_event_listener(EventKind::Shutdown, move || -> Result<(), HookError> {
            if !running.replace(false) {
                return Err(HookError::Adapter {
                    adapter: adapter.clone(),
                    reason: "not running".to_string(),
                });
            }
            info!(adapter = %adapter, "Adapter stopped");
            Ok(())
        });
    }

    fn write_node(&self, registry: &mut Registry, node: &SimNodeConfig, value: Value) {
        let data = NodeData {
            value,
            mode: "f".to_string(),
            unit: node.unit.clone(),
            unit_min: node.unit_min,
            unit_max: node.unit_max,
        };
        if let Err(miss) = registry.write_data(&self.config.object, &self.config.frame, &node.name, data) {
            debug!(adapter = %self.config.name, node = %node.name, error = %miss, "Write skipped");
        }
    }
}

/// Sample a waveform at `t` seconds, scaled into the node's unit range
pub fn sample(node: &SimNodeConfig, t: f64) -> f64 {
    let phase = (t / node.period_secs).fract();
    let raw = match node.waveform {
        Waveform::Sine => (phase * TAU).sin(),
        Waveform::Ramp => phase * 2.0 - 1.0,
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Input => 0.0,
    };
    map(raw, -1.0, 1.0, node.unit_min, node.unit_max)
}

impl Adapter for SimulatedAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn start(&mut self, registry: &mut Registry) {
        self.advertise(registry);
        self.register_callbacks(registry);
        self.running.set(true);
        info!(
            adapter = %self.config.name,
            object = %self.config.object,
            nodes = self.config.nodes.len(),
            "Adapter started"
        );
    }

    fn tick(&mut self, registry: &mut Registry, elapsed: Duration) {
        if !self.running.get() {
            return;
        }
        if self.readvertise.replace(false) {
            debug!(adapter = %self.config.name, "Re-advertising after reset");
            self.advertise(registry);
        }

        let t = elapsed.as_secs_f64();
        for node in self.config.nodes.iter().filter(|n| n.waveform != Waveform::Input) {
            self.write_node(registry, node, Value::from(sample(node, t)));
        }

        let received: Vec<_> = self.inbox.borrow_mut().drain(..).collect();
        for (name, data) in received {
            let Some(node) = self.config.nodes.iter().find(|n| n.name == name) else {
                continue;
            };
            let value = data.get("value").cloned().unwrap_or(data);
            self.write_node(registry, node, value);
        }
    }
}
