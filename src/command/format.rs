//! Format Command
//!
//! Formats the filesystem's targets. Clients never participate; a target
//! found started maps to a plain failure, since formatting it would
//! destroy a live filesystem. The configuration backend is notified of the
//! formatting → formatted/format-failed transition around the run.

use crate::action::Operation;
use crate::command::{reduce_states, report_proxy_errors, ReturnCode};
use crate::component::{ComponentState, Role};
use crate::config::{FsConfigHandle, FsConfigStatus};
use crate::dispatch::NodeSet;
use crate::event::EventHandler;
use crate::fs::{FileSystem, RunContext, Selection};
use tracing::{error, info};

/// Driver for `format`.
#[derive(Debug, Clone, Default)]
pub struct FormatCommand {
    /// Restrict the run to these hosts; must stay inside the managed set.
    pub nodes: Option<NodeSet>,
    /// Restrict to one target role.
    pub target_role: Option<Role>,
    /// Restrict to one target index within the role.
    pub target_index: Option<u32>,
}

impl FormatCommand {
    /// Component-state → return-code table for format.
    pub fn state_rc(state: Option<ComponentState>) -> ReturnCode {
        match state {
            Some(ComponentState::Offline) => ReturnCode::Ok,
            Some(ComponentState::External) => ReturnCode::External,
            // A started target cannot be formatted.
            Some(ComponentState::Mounted) | Some(ComponentState::Recovering) => {
                ReturnCode::Failure
            }
            Some(ComponentState::ClientError) => ReturnCode::ClientError,
            Some(ComponentState::TargetError) => ReturnCode::TargetError,
            Some(ComponentState::RuntimeError) | None => ReturnCode::RuntimeError,
        }
    }

    pub async fn execute(
        &self,
        fs: &mut FileSystem,
        config: &dyn FsConfigHandle,
        ctx: &RunContext,
        handler: &mut dyn EventHandler,
    ) -> ReturnCode {
        if let Err(err) = fs.check_node_list(Operation::Format, self.nodes.as_ref()) {
            error!("{}", err);
            return ReturnCode::Failure;
        }

        // Ignore all clients for this command.
        fs.set_clients_enabled(false);
        let selection = Selection {
            nodes: self.nodes.clone(),
            target_role: self.target_role,
            target_index: self.target_index,
        };

        handler.pre(fs);
        if let Err(err) = config.set_fs_status(FsConfigStatus::Formatting) {
            error!("{}", err);
        }

        let rc = match fs.run(Operation::Format, ctx, handler, &selection).await {
            Ok(_) => reduce_states(&fs.states_for(Operation::Format, &selection), Self::state_rc),
            Err(err) if err.is_validation() => {
                error!("{}", err);
                ReturnCode::Failure
            }
            Err(err) => {
                error!("{}", err);
                ReturnCode::RuntimeError
            }
        };

        let fs_status = if rc == ReturnCode::Ok {
            info!("Format of '{}' successful", fs.fs_name);
            FsConfigStatus::Formatted
        } else {
            report_proxy_errors(fs, rc);
            FsConfigStatus::FormatFailed
        };
        if let Err(err) = config.set_fs_status(fs_status) {
            error!("{}", err);
        }

        handler.post(fs);
        fs.set_clients_enabled(true);
        rc
    }
}
