//! Status Command
//!
//! Checks every component's live state. Any determinate healthy or
//! offline state is a success for this command; rendering the collected
//! states for humans is the caller's business.

use crate::action::Operation;
use crate::command::{reduce_states, report_proxy_errors, ReturnCode};
use crate::component::ComponentState;
use crate::dispatch::NodeSet;
use crate::event::EventHandler;
use crate::fs::{FileSystem, RunContext, Selection};
use tracing::error;

/// Driver for `status`.
#[derive(Debug, Clone, Default)]
pub struct StatusCommand {
    /// Restrict the run to these hosts; must stay inside the managed set.
    pub nodes: Option<NodeSet>,
}

impl StatusCommand {
    /// Component-state → return-code table for status.
    pub fn state_rc(state: Option<ComponentState>) -> ReturnCode {
        match state {
            Some(ComponentState::Offline)
            | Some(ComponentState::Mounted)
            | Some(ComponentState::Recovering) => ReturnCode::Ok,
            Some(ComponentState::External) => ReturnCode::External,
            Some(ComponentState::ClientError) => ReturnCode::ClientError,
            Some(ComponentState::TargetError) => ReturnCode::TargetError,
            Some(ComponentState::RuntimeError) | None => ReturnCode::RuntimeError,
        }
    }

    pub async fn execute(
        &self,
        fs: &mut FileSystem,
        ctx: &RunContext,
        handler: &mut dyn EventHandler,
    ) -> ReturnCode {
        if let Err(err) = fs.check_node_list(Operation::Status, self.nodes.as_ref()) {
            error!("{}", err);
            return ReturnCode::Failure;
        }
        let selection = Selection {
            nodes: self.nodes.clone(),
            ..Default::default()
        };

        handler.pre(fs);
        let rc = match fs.run(Operation::Status, ctx, handler, &selection).await {
            Ok(_) => reduce_states(&fs.states_for(Operation::Status, &selection), Self::state_rc),
            Err(err) if err.is_validation() => {
                error!("{}", err);
                ReturnCode::Failure
            }
            Err(err) => {
                error!("{}", err);
                ReturnCode::RuntimeError
            }
        };
        report_proxy_errors(fs, rc);
        handler.post(fs);
        rc
    }
}
