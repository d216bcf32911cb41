//! Event Handlers
//!
//! Consumers of decoded filesystem events. Every slot has a default no-op
//! body, standing in for the capability checks the original design made by
//! probing for method presence: a handler implements exactly the hooks it
//! cares about, and callers invoke them unconditionally.

use crate::action::{ActionResult, Operation};
use crate::component::Component;
use crate::config::{ComponentConfigStatus, FsConfigHandle};
use crate::fs::FileSystem;
use crate::proto::FsEvent;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

// =============================================================================
// Capability Interface
// =============================================================================

/// Event handler capability interface.
///
/// Per-component slots fire once per decoded event; `pre`/`post` wrap a
/// whole command run; `handle_pre`/`handle_post` wrap one filesystem's
/// fan-out within that run.
pub trait EventHandler {
    /// The operation began on one component.
    fn ev_start(&mut self, op: Operation, node: &str, comp: &Component) {
        let _ = (op, node, comp);
    }

    /// The operation completed on one component.
    fn ev_done(&mut self, op: Operation, node: &str, comp: &Component, result: &ActionResult) {
        let _ = (op, node, comp, result);
    }

    /// The operation failed on one component.
    fn ev_failed(&mut self, op: Operation, node: &str, comp: &Component, result: &ActionResult) {
        let _ = (op, node, comp, result);
    }

    /// Whole-run pre hook.
    fn pre(&mut self, fs: &FileSystem) {
        let _ = fs;
    }

    /// Whole-run post hook.
    fn post(&mut self, fs: &FileSystem) {
        let _ = fs;
    }

    /// Whole-filesystem pre hook.
    fn handle_pre(&mut self, fs: &FileSystem) {
        let _ = fs;
    }

    /// Whole-filesystem post hook.
    fn handle_post(&mut self, fs: &FileSystem) {
        let _ = fs;
    }
}

/// Handler that ignores every event.
#[derive(Debug, Default)]
pub struct NullEventHandler;

impl EventHandler for NullEventHandler {}

// =============================================================================
// Global Handler (orchestrator node)
// =============================================================================

/// Handler running on the orchestrator node: logs per-component progress
/// and persists status transitions through the configuration backend.
pub struct GlobalEventHandler {
    config: Arc<dyn FsConfigHandle>,
    /// Components seen done so far in this run.
    pub done_count: usize,
    /// Components seen failed so far in this run.
    pub failed_count: usize,
}

impl GlobalEventHandler {
    pub fn new(config: Arc<dyn FsConfigHandle>) -> Self {
        Self {
            config,
            done_count: 0,
            failed_count: 0,
        }
    }

    fn notify(&self, comp: &Component, status: ComponentConfigStatus) {
        if let Err(e) = self.config.set_component_status(&comp.tag, status) {
            warn!("Config backend refused status for {}: {}", comp.tag, e);
        }
    }
}

impl EventHandler for GlobalEventHandler {
    fn ev_start(&mut self, op: Operation, node: &str, comp: &Component) {
        info!("{}: {} of {} started", node, op, comp.tag);
        if op == Operation::Format {
            self.notify(comp, ComponentConfigStatus::Formatting);
        }
    }

    fn ev_done(&mut self, op: Operation, node: &str, comp: &Component, result: &ActionResult) {
        self.done_count += 1;
        info!("{}: {} of {} done: {}", node, op, comp.tag, result.message);
        match op {
            Operation::Format => self.notify(comp, ComponentConfigStatus::Formatted),
            Operation::Mount => self.notify(comp, ComponentConfigStatus::Mounted),
            Operation::Umount => self.notify(comp, ComponentConfigStatus::Unmounted),
            Operation::Status => {}
        }
    }

    fn ev_failed(&mut self, op: Operation, node: &str, comp: &Component, result: &ActionResult) {
        self.failed_count += 1;
        warn!(
            "{}: {} of {} failed: {} (rc={:?})",
            node, op, comp.tag, result.message, result.remote_rc
        );
        if op == Operation::Format {
            self.notify(comp, ComponentConfigStatus::FormatFailed);
        }
    }
}

// =============================================================================
// Local Handler (remote mode)
// =============================================================================

/// Handler running in remote mode on a managed node: re-encodes each event
/// as one envelope line on the given writer (normally stdout), where the
/// orchestrator-side proxy action reconstructs it.
pub struct LocalEventHandler<W: Write> {
    out: W,
}

impl<W: Write> LocalEventHandler<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, event: &FsEvent) {
        // stdout going away means the orchestrator hung up; nothing left
        // to report to.
        let _ = writeln!(self.out, "{}", event.to_envelope().encode());
        let _ = self.out.flush();
    }
}

impl<W: Write> EventHandler for LocalEventHandler<W> {
    fn ev_start(&mut self, op: Operation, _node: &str, comp: &Component) {
        self.emit(&FsEvent::Start {
            op,
            tag: comp.tag.clone(),
        });
    }

    fn ev_done(&mut self, op: Operation, _node: &str, comp: &Component, result: &ActionResult) {
        self.emit(&FsEvent::Done {
            op,
            tag: comp.tag.clone(),
            message: Some(result.message.clone()),
            state: comp.state,
        });
    }

    fn ev_failed(&mut self, op: Operation, _node: &str, comp: &Component, result: &ActionResult) {
        self.emit(&FsEvent::Failed {
            op,
            tag: comp.tag.clone(),
            rc: result.remote_rc,
            message: result.message.clone(),
            state: comp.state,
        });
    }
}
