//! Proxy Action
//!
//! An action executed by fanning a remote-mode command out to a node set
//! and reconstructing its outcome from the decoded event stream plus the
//! per-node process exit codes. An exit-code failure is authoritative for
//! the action even when every decoded event reported success: a remote
//! process can crash after emitting its final event, or before emitting
//! anything at all.

use crate::action::{ActionStatus, Operation};
use crate::component::Role;
use crate::dispatch::{DispatchEvent, NodeSet, RemoteDispatcher};
use crate::error::Result;
use crate::proto::{Envelope, FsEvent};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

// =============================================================================
// Proxy Errors
// =============================================================================

/// One distinct remote failure: the nodes it was observed on and the
/// message describing it. Entries are grouped by identical message and
/// node set, never deduplicated further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyError {
    pub nodes: NodeSet,
    pub message: String,
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.nodes, self.message)
    }
}

// =============================================================================
// Proxy Action
// =============================================================================

/// A proxy action bound to one operation and one node set.
#[derive(Debug)]
pub struct ProxyAction {
    program_path: String,
    operation: Operation,
    fs_name: String,
    nodes: NodeSet,
    target_role: Option<Role>,
    target_index: Option<u32>,
    /// Lifecycle of the fan-out as a whole.
    pub status: ActionStatus,
}

impl ProxyAction {
    pub fn new(
        program_path: impl Into<String>,
        operation: Operation,
        fs_name: impl Into<String>,
        nodes: NodeSet,
    ) -> Self {
        Self {
            program_path: program_path.into(),
            operation,
            fs_name: fs_name.into(),
            nodes,
            target_role: None,
            target_index: None,
            status: ActionStatus::NotStarted,
        }
    }

    /// Restrict the remote side to one target role, and optionally one
    /// target index within that role.
    pub fn with_target_filter(mut self, role: Role, index: Option<u32>) -> Self {
        self.target_role = Some(role);
        self.target_index = index;
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    /// The remote-invocable command line for this action.
    pub fn command_line(&self) -> String {
        let mut command = vec![
            self.program_path.clone(),
            self.operation.to_string(),
            format!("-f {}", self.fs_name),
            "--remote".to_string(),
        ];
        if let Some(role) = self.target_role {
            command.push(format!("-t {}", role));
            if let Some(index) = self.target_index {
                command.push(format!("-i {}", index));
            }
        }
        command.join(" ")
    }

    /// Submit the command across the node set.
    pub async fn launch(
        &mut self,
        dispatcher: &dyn RemoteDispatcher,
    ) -> Result<mpsc::Receiver<DispatchEvent>> {
        assert_eq!(
            self.status,
            ActionStatus::NotStarted,
            "proxy action for '{}' launched twice",
            self.operation,
        );
        self.status = ActionStatus::Running;
        info!(
            "Launching {} of '{}' on {}",
            self.operation, self.fs_name, self.nodes
        );
        dispatcher.submit(&self.command_line(), &self.nodes).await
    }

    /// Try to decode one output line as a typed event.
    ///
    /// A line that is not a protocol message is returned untouched so the
    /// caller can surface it verbatim; it never fails the run.
    pub fn decode_line(line: &str) -> std::result::Result<FsEvent, &str> {
        match Envelope::decode(line).and_then(|env| FsEvent::from_envelope(&env)) {
            Ok(event) => Ok(event),
            Err(err) => {
                debug!("Passing through undecodable line: {}", err);
                Err(line)
            }
        }
    }

    /// Finalize after quiescence: group nodes by exit code and turn every
    /// non-zero group into one proxy error entry.
    pub fn complete(&mut self, exit_codes: &BTreeMap<String, i32>) -> Vec<ProxyError> {
        assert_eq!(
            self.status,
            ActionStatus::Running,
            "proxy action for '{}' completed but was not running",
            self.operation,
        );
        debug_assert_eq!(exit_codes.len(), self.nodes.len());

        let mut by_code: BTreeMap<i32, NodeSet> = BTreeMap::new();
        for (node, code) in exit_codes {
            by_code.entry(*code).or_default().insert(node.clone());
        }

        let errors: Vec<ProxyError> = by_code
            .into_iter()
            .filter(|(code, _)| *code != 0)
            .map(|(code, nodes)| ProxyError {
                nodes,
                message: format!("{} failed with exit code {}", self.operation, code),
            })
            .collect();

        self.status = if errors.is_empty() {
            ActionStatus::Done
        } else {
            ActionStatus::Failed
        };
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn action() -> ProxyAction {
        let nodes: NodeSet = ["nas1", "nas2", "nas3"].into_iter().collect();
        ProxyAction::new("/usr/sbin/cfsctl", Operation::Format, "fs1", nodes)
    }

    #[test]
    fn test_command_line_tokens() {
        let cmd = action()
            .with_target_filter(Role::Ost, Some(2))
            .command_line();
        assert_eq!(cmd, "/usr/sbin/cfsctl format -f fs1 --remote -t ost -i 2");

        let cmd = action().command_line();
        assert_eq!(cmd, "/usr/sbin/cfsctl format -f fs1 --remote");
    }

    #[test]
    fn test_complete_groups_exit_codes() {
        let mut action = action();
        action.status = ActionStatus::Running;

        let codes: BTreeMap<String, i32> = [
            ("nas1".to_string(), 0),
            ("nas2".to_string(), 1),
            ("nas3".to_string(), 1),
        ]
        .into_iter()
        .collect();

        let errors = action.complete(&codes);
        assert_eq!(action.status, ActionStatus::Failed);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].nodes.to_string(), "nas2,nas3");
        assert!(errors[0].message.contains("exit code 1"));
    }

    #[test]
    fn test_complete_all_zero_is_done() {
        let mut action = action();
        action.status = ActionStatus::Running;

        let codes: BTreeMap<String, i32> = ["nas1", "nas2", "nas3"]
            .into_iter()
            .map(|n| (n.to_string(), 0))
            .collect();

        assert!(action.complete(&codes).is_empty());
        assert_eq!(action.status, ActionStatus::Done);
    }

    #[test]
    fn test_decode_line_passthrough() {
        assert!(ProxyAction::decode_line("mkfs.ext4: writing inode tables").is_err());

        let env = Envelope::new(
            "format_start",
            [("tag".to_string(), Value::from("fs1-OST0000"))]
                .into_iter()
                .collect(),
        );
        let ev = ProxyAction::decode_line(&env.encode()).unwrap();
        assert_eq!(ev.tag(), "fs1-OST0000");
    }
}
