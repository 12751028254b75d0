//! Host side of the registry: outbound message stream and persistence

use anyhow::Result;
use nodehub_core::{Host, HostMessage, ObjectId, ObjectStore, ResetEvent, WriteEvent};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Objects waiting to be written to disk
pub type PendingPersist = Rc<RefCell<BTreeSet<ObjectId>>>;

/// Host writing outbound messages as JSON lines to a sink (stdout by default)
pub struct LineHost<W: Write> {
    out: W,
    pending: PendingPersist,
    writes: u64,
}

impl<W: Write> LineHost<W> {
    pub fn new(out: W, pending: PendingPersist) -> Self {
        Self {
            out,
            pending,
            writes: 0,
        }
    }
}

impl<W: Write> Host for LineHost<W> {
    fn on_write(&mut self, event: WriteEvent<'_>) {
        self.writes += 1;
        debug!(
            object = %event.address.object,
            node = %event.address.node,
            value = %event.data.value,
            mode = %event.data.mode,
            total = self.writes,
            "Node value changed"
        );
    }

    fn emit(&mut self, message: HostMessage) {
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode host message");
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write host message");
        }
    }

    fn persist(&mut self, object: &ObjectId) {
        self.pending.borrow_mut().insert(object.clone());
    }

    fn on_reset(&mut self, event: ResetEvent<'_>) {
        info!(
            objects = event.store.len(),
            readvertised = event.readvertised,
            "Reset sweep reported"
        );
    }
}

/// Path an object is persisted to
pub fn object_file(base_dir: &Path, object_name: &str) -> PathBuf {
    base_dir.join(object_name).join("object.json")
}

/// Write every pending object to `<base_dir>/<object name>/object.json`
pub fn flush_pending(pending: &PendingPersist, store: &ObjectStore, base_dir: &Path) -> Result<usize> {
    let ids: Vec<ObjectId> = std::mem::take(&mut *pending.borrow_mut()).into_iter().collect();
    let mut written = 0;
    for id in ids {
        let Ok(object) = store.object(&id) else {
            debug!(object = %id, "Persist requested for unknown object");
            continue;
        };
        let path = object_file(base_dir, &object.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(object)?)?;
        info!(object = %id, path = %path.display(), "Persisted object");
        written += 1;
    }
    Ok(written)
}
