//! Filesystem Aggregate
//!
//! Owns the component set of one filesystem instance, fans actions out
//! over the relevant subset through the dispatch facility, applies decoded
//! events to component state as they stream in, and keeps the accumulated
//! proxy error list for end-of-run reporting.
//!
//! All mutation happens on the one task draining the dispatch stream, so
//! the component collection needs no locking; the single-action invariant
//! is the only cross-action discipline, enforced by assertion on the
//! local execution path. Decoded wire events are untrusted input: one
//! that does not fit the component's in-flight action is dropped as a
//! diagnostic, like an unknown tag, never treated as an invariant
//! violation.

use crate::action::proxy::{ProxyAction, ProxyError};
use crate::action::{ActionResult, ActionStatus, Operation};
use crate::component::{Component, ComponentState, Role};
use crate::dispatch::{DispatchEvent, NodeSet, RemoteDispatcher};
use crate::error::{Error, Result};
use crate::event::EventHandler;
use crate::proto::FsEvent;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

// =============================================================================
// Run Context
// =============================================================================

/// Execution context owned by the top-level command invocation and passed
/// to the orchestrator explicitly; there is no ambient process-wide
/// dispatch singleton.
#[derive(Clone)]
pub struct RunContext {
    /// Concurrent remote-execution facility.
    pub dispatcher: Arc<dyn RemoteDispatcher>,
    /// Path of the remote-invocable program on managed nodes.
    pub program_path: String,
}

impl RunContext {
    pub fn new(dispatcher: Arc<dyn RemoteDispatcher>, program_path: impl Into<String>) -> Self {
        Self {
            dispatcher,
            program_path: program_path.into(),
        }
    }
}

// =============================================================================
// Selection Filters
// =============================================================================

/// Restricts which components one run touches.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Only components whose primary server is in this set.
    pub nodes: Option<NodeSet>,
    /// Only targets of this role.
    pub target_role: Option<Role>,
    /// Only the target with this index, within the role filter.
    pub target_index: Option<u32>,
}

// =============================================================================
// FileSystem
// =============================================================================

/// One filesystem instance and its manageable components.
pub struct FileSystem {
    pub fs_name: String,
    components: Vec<Component>,
    /// One entry per distinct remote failure of the current command,
    /// ordered as observed.
    pub proxy_errors: Vec<ProxyError>,
}

impl FileSystem {
    pub fn new(fs_name: impl Into<String>) -> Self {
        Self {
            fs_name: fs_name.into(),
            components: Vec::new(),
            proxy_errors: Vec::new(),
        }
    }

    pub fn add(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, tag: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.tag == tag)
    }

    /// Enable or disable all clients for the current run. Target
    /// operations disable clients so they never land in the selection.
    pub fn set_clients_enabled(&mut self, enabled: bool) {
        for comp in &mut self.components {
            if comp.role == Role::Client {
                comp.enabled = enabled;
            }
        }
    }

    fn selected(&self, operation: Operation, selection: &Selection) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled && c.supports(operation))
            .filter(|(_, c)| match selection.target_role {
                Some(role) => c.role == role,
                None => true,
            })
            .filter(|(_, c)| match selection.target_index {
                Some(index) => c.index == Some(index),
                None => true,
            })
            .filter(|(_, c)| match &selection.nodes {
                Some(nodes) => nodes.contains(c.primary_server()),
                None => true,
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Servers hosting enabled components that support `operation`.
    pub fn managed_servers(&self, operation: Operation) -> NodeSet {
        self.components
            .iter()
            .filter(|c| c.enabled && c.supports(operation))
            .flat_map(|c| c.servers.iter().cloned())
            .collect()
    }

    /// Validate a caller-supplied node list against the managed set,
    /// before any dispatch.
    pub fn check_node_list(&self, operation: Operation, nodes: Option<&NodeSet>) -> Result<()> {
        let Some(nodes) = nodes else {
            return Ok(());
        };
        let managed = self.managed_servers(operation);
        if !nodes.is_subset(&managed) {
            return Err(Error::NodesOutsideFilesystem {
                fs_name: self.fs_name.clone(),
                operation: operation.to_string(),
                nodes: nodes.difference(&managed).to_string(),
            });
        }
        Ok(())
    }

    /// Final states of the components `operation` would select, for
    /// return-code aggregation. `None` entries are components whose true
    /// state was never determined.
    pub fn states_for(
        &self,
        operation: Operation,
        selection: &Selection,
    ) -> Vec<Option<ComponentState>> {
        self.selected(operation, selection)
            .into_iter()
            .map(|i| self.components[i].state)
            .collect()
    }

    /// Worst state among the selected components (worst-state-wins).
    pub fn worst_state(
        &self,
        operation: Operation,
        selection: &Selection,
    ) -> Option<ComponentState> {
        self.states_for(operation, selection)
            .into_iter()
            .map(|s| s.unwrap_or(ComponentState::RuntimeError))
            .max()
    }

    /// Fan `operation` out over the selected components and drive the
    /// dispatch stream until quiescent.
    ///
    /// Returns the terminal status of the proxy action: `Failed` when any
    /// node exited non-zero, regardless of what the decoded events said.
    pub async fn run(
        &mut self,
        operation: Operation,
        ctx: &RunContext,
        handler: &mut dyn EventHandler,
        selection: &Selection,
    ) -> Result<ActionStatus> {
        // The error list is scoped to one command.
        self.proxy_errors.clear();

        let selected = self.selected(operation, selection);
        if selected.is_empty() {
            return Err(Error::NoComponentSupports {
                fs_name: self.fs_name.clone(),
                operation: operation.to_string(),
            });
        }
        handler.handle_pre(self);

        let nodes: NodeSet = selected
            .iter()
            .map(|&i| self.components[i].primary_server().to_string())
            .collect();

        let mut action = ProxyAction::new(
            ctx.program_path.clone(),
            operation,
            self.fs_name.clone(),
            nodes,
        );
        if let Some(role) = selection.target_role {
            action = action.with_target_filter(role, selection.target_index);
        }

        let mut rx = action.launch(ctx.dispatcher.as_ref()).await?;
        let mut exit_codes: BTreeMap<String, i32> = BTreeMap::new();

        while let Some(event) = rx.recv().await {
            match event {
                DispatchEvent::OutputLine { node, line } => {
                    match ProxyAction::decode_line(&line) {
                        Ok(fs_event) => self.apply_event(operation, fs_event, &node, handler),
                        // Diagnostic passthrough; not a failure.
                        Err(raw) => info!("{}: {}", node, raw),
                    }
                }
                DispatchEvent::Exited { node, code } => {
                    exit_codes.insert(node, code);
                }
            }
        }

        let errors = action.complete(&exit_codes);
        for error in &errors {
            warn!("Proxy failure: {}", error);
        }
        self.proxy_errors.extend(errors);

        handler.handle_post(self);
        Ok(action.status)
    }

    /// Apply one decoded event to its component and notify the handler.
    fn apply_event(
        &mut self,
        operation: Operation,
        event: FsEvent,
        node: &str,
        handler: &mut dyn EventHandler,
    ) {
        if event.operation() != operation {
            warn!(
                "{}: dropping '{}' event during {}",
                node,
                event.operation(),
                operation
            );
            return;
        }
        let Some(comp) = self.components.iter_mut().find(|c| c.tag == event.tag()) else {
            warn!("{}: event for unknown component '{}'", node, event.tag());
            return;
        };

        match event {
            FsEvent::Start { op, .. } => {
                if comp.action_running() {
                    warn!("{}: dropping duplicate start for '{}'", node, comp.tag);
                    return;
                }
                comp.start_action(op);
                handler.ev_start(op, node, comp);
            }
            FsEvent::Done {
                op, message, state, ..
            } => {
                if !comp.action_running() {
                    warn!(
                        "{}: dropping '{}' completion for '{}' with no action in flight",
                        node, op, comp.tag
                    );
                    return;
                }
                let result =
                    ActionResult::message(message.unwrap_or_else(|| "done".to_string()));
                comp.action_done(op, result.clone(), state);
                handler.ev_done(op, node, comp, &result);
            }
            FsEvent::Failed {
                op,
                rc,
                message,
                state,
                ..
            } => {
                if !comp.action_running() {
                    warn!(
                        "{}: dropping '{}' failure for '{}' with no action in flight",
                        node, op, comp.tag
                    );
                    return;
                }
                comp.state = Some(state.unwrap_or_else(|| comp.role.error_state()));
                comp.status_info = Some(message.clone());
                let result = ActionResult::new(message, rc);
                comp.action_failed(op, result.clone());
                handler.ev_failed(op, node, comp, &result);
            }
        }
    }
}
