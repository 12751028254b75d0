//! Reset and shutdown hooks
//!
//! Hooks fire synchronously in registration order. A failing hook is logged
//! and recorded in the returned [`LifecycleReport`]; the remaining hooks
//! still run.

use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::host::ResetEvent;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Reset,
    Shutdown,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Reset => "reset",
            EventKind::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown lifecycle event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(EventKind::Reset),
            "shutdown" => Ok(EventKind::Shutdown),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("{0}")]
    Failed(String),
    #[error("Adapter {adapter} failed: {reason}")]
    Adapter { adapter: String, reason: String },
}

/// A reset or shutdown hook
pub trait LifecycleHook {
    fn run(&mut self) -> Result<(), HookError>;
}

impl<F> LifecycleHook for F
where
    F: FnMut() -> Result<(), HookError>,
{
    fn run(&mut self) -> Result<(), HookError> {
        self()
    }
}

/// A hook that returned an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    /// Position of the hook in registration order
    pub index: usize,
    pub error: HookError,
}

/// Outcome of firing one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleReport {
    pub kind: EventKind,
    pub ran: usize,
    pub failures: Vec<HookFailure>,
}

impl LifecycleReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
pub struct Hooks {
    reset: Vec<Box<dyn LifecycleHook>>,
    shutdown: Vec<Box<dyn LifecycleHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&mut self, kind: EventKind) -> &mut Vec<Box<dyn LifecycleHook>> {
        match kind {
            EventKind::Reset => &mut self.reset,
            EventKind::Shutdown => &mut self.shutdown,
        }
    }

    /// Append a hook. Repeat registrations accumulate.
    pub fn add(&mut self, kind: EventKind, hook: Box<dyn LifecycleHook>) {
        self.list(kind).push(hook);
    }

    pub fn len(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Reset => self.reset.len(),
            EventKind::Shutdown => self.shutdown.len(),
        }
    }

    /// Run every hook of a kind in order
    pub fn fire(&mut self, kind: EventKind) -> LifecycleReport {
        let hooks = self.list(kind);
        let mut failures = Vec::new();
        for (index, hook) in hooks.iter_mut().enumerate() {
            if let Err(error) = hook.run() {
                warn!(event = %kind, index, error = %error, "Lifecycle hook failed");
                failures.push(HookFailure { index, error });
            }
        }
        LifecycleReport {
            kind,
            ran: hooks.len(),
            failures,
        }
    }
}

impl Registry {
    /// Register a reset or shutdown hook
    pub fn add_event_listener(&mut self, kind: EventKind, hook: impl LifecycleHook + 'static) {
        debug!(event = %kind, "Add lifecycle listener");
        self.hooks.add(kind, Box::new(hook));
    }

    /// Re-advertise every adapter-owned node, prune each object, notify the
    /// host, then run the reset hooks.
    pub fn reset(&mut self) -> LifecycleReport {
        let mut advertised = Vec::new();
        for object in self.store.objects() {
            for frame in object.frames.values() {
                for node in frame.nodes.values().filter(|n| n.is_adapter_owned()) {
                    advertised.push((
                        object.id.clone(),
                        object.name.clone(),
                        frame.name.clone(),
                        node.name.clone(),
                        node.node_type.clone(),
                    ));
                }
            }
        }

        let objects: Vec<_> = self.store.objects().map(|o| o.id.clone()).collect();
        for (object_id, object_name, frame_name, node_name, node_type) in &advertised {
            self.add_node_at(object_id, object_name, frame_name, node_name, node_type);
        }
        for object_id in &objects {
            self.prune(object_id, None);
        }
        info!(objects = objects.len(), nodes = advertised.len(), "Reset sweep complete");
        self.host.on_reset(ResetEvent {
            store: &self.store,
            readvertised: advertised.len(),
        });

        self.hooks.fire(EventKind::Reset)
    }

    /// Run the shutdown hooks
    pub fn shutdown(&mut self) -> LifecycleReport {
        info!(hooks = self.hooks.len(EventKind::Shutdown), "Calling shutdown hooks");
        self.hooks.fire(EventKind::Shutdown)
    }
}
