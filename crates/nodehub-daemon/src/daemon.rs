//! Daemon state: the registry, its adapters and pending persistence

use nodehub_core::{DirectoryResolver, LifecycleReport, Registry, Wiring};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::adapter::{Adapter, SimulatedAdapter};
use crate::config::Config;
use crate::host::{flush_pending, LineHost, PendingPersist};
use crate::inbound::Inbound;

/// What the main loop should do after handling a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Daemon {
    registry: Registry,
    adapters: Vec<Box<dyn Adapter>>,
    pending: PendingPersist,
    base_dir: PathBuf,
    started: Instant,
}

impl Daemon {
    /// Wire the registry and start every configured adapter
    pub fn new(config: Config, out: impl Write + 'static) -> Self {
        let pending = PendingPersist::default();
        let base_dir = config.registry.base_dir.clone();

        let registry = Registry::new(Wiring {
            config: config.registry,
            resolver: Box::new(DirectoryResolver::new(config.objects)),
            host: Box::new(LineHost::new(out, pending.clone())),
            modules: config.modules,
            store: Default::default(),
        });

        let mut daemon = Self {
            registry,
            adapters: Vec::new(),
            pending,
            base_dir,
            started: Instant::now(),
        };
        for adapter in config.adapters {
            daemon.add_adapter(Box::new(SimulatedAdapter::new(adapter)));
        }
        daemon
    }

    pub fn add_adapter(&mut self, mut adapter: Box<dyn Adapter>) {
        adapter.start(&mut self.registry);
        debug!(adapter = %adapter.name(), "Adapter registered");
        self.adapters.push(adapter);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Poll every adapter once
    pub fn tick(&mut self) {
        self.tick_at(self.started.elapsed());
    }

    fn tick_at(&mut self, elapsed: Duration) {
        for adapter in self.adapters.iter_mut() {
            adapter.tick(&mut self.registry, elapsed);
        }
        self.flush();
    }

    pub fn reset(&mut self) -> LifecycleReport {
        let report = self.registry.reset();
        log_report(&report);
        report
    }

    pub fn shutdown(&mut self) -> LifecycleReport {
        let report = self.registry.shutdown();
        log_report(&report);
        self.flush();
        report
    }

    /// Handle one inbound JSON line
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        let call = match Inbound::parse(line) {
            Ok(call) => call,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed inbound call");
                return Flow::Continue;
            }
        };

        match &call {
            Inbound::Reset => {
                self.reset();
            }
            Inbound::Shutdown => return Flow::Stop,
            _ => {
                if let Err(miss) = call.apply(&mut self.registry) {
                    debug!(error = %miss, "Inbound call missed");
                }
            }
        }
        self.flush();
        Flow::Continue
    }

    fn flush(&mut self) {
        match flush_pending(&self.pending, self.registry.store(), &self.base_dir) {
            Ok(0) => {}
            Ok(n) => debug!(objects = n, "Flushed pending objects"),
            Err(e) => warn!(error = %e, "Failed to persist objects"),
        }
    }
}

fn log_report(report: &LifecycleReport) {
    if report.is_clean() {
        info!(event = %report.kind, hooks = report.ran, "Lifecycle event complete");
    } else {
        warn!(
            event = %report.kind,
            hooks = report.ran,
            failed = report.failures.len(),
            "Lifecycle event finished with failures"
        );
    }
}
