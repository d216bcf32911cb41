//! Local Actions
//!
//! The remote-mode execution path: drives one component on the node that
//! hosts it. The actual mkfs/mount binaries live behind the
//! [`ActionRunner`] port; this module owns the lifecycle bookkeeping, the
//! health-check gate, and the no-op short-circuits.

use crate::action::{ActionResult, Operation};
use crate::component::{Component, ComponentState, HealthProbe};
use crate::error::Result;
use crate::event::EventHandler;

/// Port to the external processes that do the real work (mkfs, mount,
/// umount). Implementations return the outcome message; failures come back
/// as component errors carrying the matching error state.
pub trait ActionRunner: Send + Sync {
    fn run(&self, component: &Component, operation: Operation) -> Result<ActionResult>;
}

/// Drives local actions for the components hosted on one node.
pub struct LocalAction<'a> {
    fs_name: &'a str,
    node: &'a str,
    probe: &'a dyn HealthProbe,
    runner: &'a dyn ActionRunner,
}

impl<'a> LocalAction<'a> {
    pub fn new(
        fs_name: &'a str,
        node: &'a str,
        probe: &'a dyn HealthProbe,
        runner: &'a dyn ActionRunner,
    ) -> Self {
        Self {
            fs_name,
            node,
            probe,
            runner,
        }
    }

    /// Check one component's status.
    pub fn status(&self, comp: &mut Component, handler: &mut dyn EventHandler) {
        comp.start_action(Operation::Status);
        handler.ev_start(Operation::Status, self.node, comp);

        match comp.health_check(self.probe) {
            Ok(()) => {
                let state = comp.state.unwrap_or(ComponentState::RuntimeError);
                let result = ActionResult::message(state.to_string());
                comp.action_done(Operation::Status, result.clone(), comp.state);
                handler.ev_done(Operation::Status, self.node, comp, &result);
            }
            Err(err) => self.finish_failed(comp, handler, Operation::Status, err.to_string()),
        }
    }

    /// Mount one component; short-circuits when already mounted.
    pub fn mount(&self, comp: &mut Component, handler: &mut dyn EventHandler) {
        comp.start_action(Operation::Mount);
        handler.ev_start(Operation::Mount, self.node, comp);

        match comp.health_check(self.probe) {
            Ok(()) if comp.state == Some(ComponentState::Mounted) => {
                let mtpt = comp
                    .status_info
                    .clone()
                    .or_else(|| comp.mount_path.clone())
                    .unwrap_or_else(|| "?".into());
                let result = ActionResult::message(format!(
                    "{} is already mounted on {}",
                    self.fs_name, mtpt
                ));
                comp.action_done(Operation::Mount, result.clone(), None);
                handler.ev_done(Operation::Mount, self.node, comp, &result);
            }
            Ok(()) => self.run_real(comp, handler, Operation::Mount),
            Err(err) => self.finish_failed(comp, handler, Operation::Mount, err.to_string()),
        }
    }

    /// Unmount one component; short-circuits when already offline.
    pub fn umount(&self, comp: &mut Component, handler: &mut dyn EventHandler) {
        comp.start_action(Operation::Umount);
        handler.ev_start(Operation::Umount, self.node, comp);

        match comp.health_check(self.probe) {
            Ok(()) if comp.state == Some(ComponentState::Offline) => {
                let result =
                    ActionResult::message(format!("{} is not mounted", self.fs_name));
                comp.action_done(Operation::Umount, result.clone(), None);
                handler.ev_done(Operation::Umount, self.node, comp, &result);
            }
            Ok(()) => self.run_real(comp, handler, Operation::Umount),
            Err(err) => self.finish_failed(comp, handler, Operation::Umount, err.to_string()),
        }
    }

    /// Format one target. Refuses a started target instead of running.
    pub fn format(&self, comp: &mut Component, handler: &mut dyn EventHandler) {
        comp.start_action(Operation::Format);
        handler.ev_start(Operation::Format, self.node, comp);

        match comp.health_check(self.probe) {
            Ok(())
                if matches!(
                    comp.state,
                    Some(ComponentState::Mounted) | Some(ComponentState::Recovering)
                ) =>
            {
                comp.state = Some(comp.role.error_state());
                self.finish_failed(
                    comp,
                    handler,
                    Operation::Format,
                    format!("{} is started and cannot be formatted", comp.tag),
                );
            }
            Ok(()) => self.run_real(comp, handler, Operation::Format),
            Err(err) => self.finish_failed(comp, handler, Operation::Format, err.to_string()),
        }
    }

    fn run_real(&self, comp: &mut Component, handler: &mut dyn EventHandler, op: Operation) {
        match self.runner.run(comp, op) {
            Ok(result) => {
                comp.action_done(op, result.clone(), None);
                handler.ev_done(op, self.node, comp, &result);
            }
            Err(err) => {
                comp.state = Some(
                    err.component_state()
                        .unwrap_or_else(|| comp.role.error_state()),
                );
                self.finish_failed(comp, handler, op, err.to_string());
            }
        }
    }

    fn finish_failed(
        &self,
        comp: &mut Component,
        handler: &mut dyn EventHandler,
        op: Operation,
        message: String,
    ) {
        let result = ActionResult::message(message);
        comp.action_failed(op, result.clone());
        handler.ev_failed(op, self.node, comp, &result);
    }
}
