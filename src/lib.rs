//! ClusterFS Orchestrator - Distributed Control Plane
//!
//! A control-plane library for administering a clustered storage
//! filesystem: it drives format, mount, umount and status operations
//! against storage targets and client mounts spread across many hosts,
//! tracks each component's state, and reduces the scattered asynchronous
//! outcomes into one filesystem-wide return code.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Command Drivers                           │
//! │        format  /  mount  /  umount  /  status  → ReturnCode      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                     FileSystem Orchestrator                      │
//! │   component selection · event application · worst-state-wins     │
//! ├───────────────────────────┬──────────────────────────────────────┤
//! │       Proxy Actions       │            Local Actions             │
//! │  command line → node set  │   health probe → runner → result     │
//! ├───────────────────────────┴──────────────────────────────────────┤
//! │              Message Envelope Protocol (CFSMSG)                  │
//! ├──────────────────────────────────────────────────────────────────┤
//! │            Remote Dispatch Facility (ssh fan-out)                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A command selects the components that support the operation, fans a
//! remote-mode invocation of this same program out to their servers, and
//! reconstructs structured events from each node's output stream. Remote
//! exit codes are collected separately: a node that crashes without
//! emitting its final event still surfaces as a proxy error.
//!
//! # Modules
//!
//! - [`component`]: component state machine shared by targets and clients
//! - [`action`]: action lifecycle, local execution, proxy fan-out
//! - [`proto`]: versioned message envelope wire protocol
//! - [`dispatch`]: concurrent remote-execution facility
//! - [`event`]: event handler capability interface
//! - [`fs`]: filesystem aggregate and orchestrator
//! - [`command`]: per-operation drivers and return-code tables
//! - [`config`]: configuration collaborator port
//! - [`error`]: error types and handling

pub mod action;
pub mod command;
pub mod component;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod fs;
pub mod proto;

// Re-export commonly used types
pub use action::{
    local::{ActionRunner, LocalAction},
    proxy::{ProxyAction, ProxyError},
    ActionResult, ActionStatus, Operation,
};
pub use command::{FormatCommand, MountCommand, ReturnCode, StatusCommand, UmountCommand};
pub use component::{Component, ComponentState, HealthProbe, ProbeReport, Role};
pub use config::{
    ComponentConfigStatus, FormatParams, FsConfigHandle, FsConfigStatus, MemoryFsConfig,
    MountParams,
};
pub use dispatch::{
    DispatchEvent, NodeSet, RemoteDispatcher, SshConfig, SshDispatcher, SPAWN_FAILURE_RC,
};
pub use error::{Error, Result};
pub use event::{EventHandler, GlobalEventHandler, LocalEventHandler, NullEventHandler};
pub use fs::{FileSystem, RunContext, Selection};
pub use proto::{Envelope, FsEvent, PROTO_PREFIX, PROTO_VERSION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
