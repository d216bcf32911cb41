//! Umount Command
//!
//! Takes components offline: stops targets and unmounts clients. A
//! component still mounted after the run is a failure for this command.

use crate::action::Operation;
use crate::command::{reduce_states, report_proxy_errors, ReturnCode};
use crate::component::ComponentState;
use crate::config::{FsConfigHandle, FsConfigStatus};
use crate::dispatch::NodeSet;
use crate::event::EventHandler;
use crate::fs::{FileSystem, RunContext, Selection};
use tracing::error;

/// Driver for `umount`.
#[derive(Debug, Clone, Default)]
pub struct UmountCommand {
    /// Restrict the run to these hosts; must stay inside the managed set.
    pub nodes: Option<NodeSet>,
}

impl UmountCommand {
    /// Component-state → return-code table for umount.
    pub fn state_rc(state: Option<ComponentState>) -> ReturnCode {
        match state {
            Some(ComponentState::Offline) => ReturnCode::Ok,
            Some(ComponentState::External) => ReturnCode::External,
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
        if let Err(err) = fs.check_node_list(Operation::Umount, self.nodes.as_ref()) {
            error!("{}", err);
            return ReturnCode::Failure;
        }
        let selection = Selection {
            nodes: self.nodes.clone(),
            ..Default::default()
        };

        handler.pre(fs);
        let rc = match fs.run(Operation::Umount, ctx, handler, &selection).await {
            Ok(_) => reduce_states(&fs.states_for(Operation::Umount, &selection), Self::state_rc),
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
            if let Err(err) = config.set_fs_status(FsConfigStatus::Offline) {
                error!("{}", err);
            }
        }
        report_proxy_errors(fs, rc);
        handler.post(fs);
        rc
    }
}
