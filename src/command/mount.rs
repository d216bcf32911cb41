//! Mount Command
//!
//! Brings components online: starts targets on their servers and mounts
//! clients at their configured mount points. A component left offline
//! after the run is a failure for this command.

use crate::action::Operation;
use crate::command::{reduce_states, report_proxy_errors, ReturnCode};
use crate::component::ComponentState;
use crate::config::{FsConfigHandle, FsConfigStatus};
use crate::dispatch::NodeSet;
use crate::event::EventHandler;
use crate::fs::{FileSystem, RunContext, Selection};
use tracing::error;

/// Driver for `mount`.
#[derive(Debug, Clone, Default)]
pub struct MountCommand {
    /// Restrict the run to these hosts; must stay inside the managed set.
    pub nodes: Option<NodeSet>,
}

impl MountCommand {
    /// Component-state → return-code table for mount.
    pub fn state_rc(state: Option<ComponentState>) -> ReturnCode {
        match state {
            Some(ComponentState::Mounted) | Some(ComponentState::Recovering) => ReturnCode::Ok,
            Some(ComponentState::External) => ReturnCode::External,
            Some(ComponentState::Offline) => ReturnCode::Failure,
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
        if let Err(err) = fs.check_node_list(Operation::Mount, self.nodes.as_ref()) {
            error!("{}", err);
            return ReturnCode::Failure;
        }
        let selection = Selection {
            nodes: self.nodes.clone(),
            ..Default::default()
        };

        handler.pre(fs);
        let rc = match fs.run(Operation::Mount, ctx, handler, &selection).await {
            Ok(_) => reduce_states(&fs.states_for(Operation::Mount, &selection), Self::state_rc),
            Err(err) if err.is_validation() => {
                error!("{}", err);
                ReturnCode::Failure
            }
            Err(err) => {
                error!("{}", err);
                ReturnCode::RuntimeError
            }
        };
        if rc == ReturnCode::Ok {
            if let Err(err) = config.set_fs_status(FsConfigStatus::Online) {
                error!("{}", err);
            }
        }
        report_proxy_errors(fs, rc);
        handler.post(fs);
        rc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_rc_table() {
        assert_eq!(
            MountCommand::state_rc(Some(ComponentState::Mounted)),
            ReturnCode::Ok
        );
        assert_eq!(
            MountCommand::state_rc(Some(ComponentState::Recovering)),
            ReturnCode::Ok
        );
        assert_eq!(
            MountCommand::state_rc(Some(ComponentState::Offline)),
            ReturnCode::Failure
        );
        assert_eq!(
            MountCommand::state_rc(Some(ComponentState::ClientError)),
            ReturnCode::ClientError
        );
        assert_eq!(MountCommand::state_rc(None), ReturnCode::RuntimeError);
    }
}
