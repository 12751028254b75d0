//! Nodehub Core - Node registry and dispatch for hardware adapters
//!
//! Hardware adapters expose addressable I/O points ("nodes") on behalf of
//! logical devices ("objects"). This crate provides:
//! - The object → frame → node store, with advertise-then-prune reconciliation
//! - A callback registry delivering host data to adapter callbacks
//! - Dispatch of adapter writes to the host
//! - Reset and shutdown lifecycle hooks
//!
//! The registry is single-threaded: every operation runs to completion and
//! every callback is invoked synchronously.

pub mod callbacks;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod id;
pub mod lifecycle;
pub mod object;
pub mod registry;
pub mod scale;
pub mod shadow;

#[cfg(test)]
mod testing;

pub use callbacks::{CallbackKind, NodeCallback};
pub use config::RegistryConfig;
pub use error::{Lookup, Miss};
pub use host::{Host, HostMessage, ModuleTables, ResetEvent, WriteEvent};
pub use id::{DirectoryResolver, FrameId, IdResolver, LookupTable, NodeAddress, NodeId, ObjectId};
pub use lifecycle::{EventKind, HookError, LifecycleHook, LifecycleReport};
pub use object::{Frame, HardwareObject, Link, Node, NodeData, ObjectStore};
pub use registry::{Registry, Wiring};
pub use scale::map;
