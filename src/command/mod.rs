//! Command Layer
//!
//! One driver per administrative operation. Each driver owns that
//! operation's component-state → return-code table, validates the node
//! list before any dispatch, invokes the optional whole-run hooks, and
//! reduces the selected components' terminal states to one numeric code
//! by maximum severity (worst-state-wins).
//!
//! Argv parsing, confirmation prompts and status rendering live outside
//! this crate; drivers are called with already-parsed intent.

pub mod format;
pub mod mount;
pub mod status;
pub mod umount;

pub use format::FormatCommand;
pub use mount::MountCommand;
pub use status::StatusCommand;
pub use umount::UmountCommand;

use crate::component::ComponentState;
use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use tracing::error;

// =============================================================================
// Return Codes
// =============================================================================

/// Return codes produced for the calling CLI.
///
/// Discriminants are the process exit codes; their numeric order is the
/// severity order, so reduction across components is a plain maximum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ReturnCode {
    /// Operation reached its goal state everywhere it applied.
    Ok = 0,
    /// Usage or validation failure, detected before any dispatch.
    Failure = 1,
    /// Component managed by another authority.
    External = 2,
    /// Client-side error.
    ClientError = 4,
    /// Target-level error.
    TargetError = 8,
    /// The true state could not be determined.
    RuntimeError = 16,
}

impl ReturnCode {
    /// Numeric process exit code.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Reduce component states through a per-operation code table by maximum
/// severity. An empty selection reduces to `Ok`.
pub(crate) fn reduce_states(
    states: &[Option<ComponentState>],
    table: fn(Option<ComponentState>) -> ReturnCode,
) -> ReturnCode {
    states
        .iter()
        .map(|state| table(*state))
        .max()
        .unwrap_or(ReturnCode::Ok)
}

/// Emit the accumulated proxy errors when the reduced code says the true
/// state is unknown.
pub(crate) fn report_proxy_errors(fs: &FileSystem, rc: ReturnCode) {
    if rc == ReturnCode::RuntimeError {
        for proxy_error in &fs.proxy_errors {
            error!("{}", proxy_error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_error_table(state: Option<ComponentState>) -> ReturnCode {
        match state {
            Some(ComponentState::Offline) | Some(ComponentState::Mounted) => ReturnCode::Ok,
            Some(ComponentState::Recovering) => ReturnCode::Ok,
            Some(ComponentState::External) => ReturnCode::External,
            Some(ComponentState::ClientError) => ReturnCode::ClientError,
            Some(ComponentState::TargetError) => ReturnCode::TargetError,
            Some(ComponentState::RuntimeError) | None => ReturnCode::RuntimeError,
        }
    }

    #[test]
    fn test_return_code_severity_order() {
        assert!(ReturnCode::Ok < ReturnCode::Failure);
        assert!(ReturnCode::Failure < ReturnCode::External);
        assert!(ReturnCode::External < ReturnCode::ClientError);
        assert!(ReturnCode::ClientError < ReturnCode::TargetError);
        assert!(ReturnCode::TargetError < ReturnCode::RuntimeError);
        assert_eq!(ReturnCode::RuntimeError.code(), 16);
    }

    #[test]
    fn test_reduce_is_order_and_count_independent() {
        let a = vec![
            Some(ComponentState::Mounted),
            Some(ComponentState::Mounted),
            Some(ComponentState::TargetError),
        ];
        let b = vec![
            Some(ComponentState::TargetError),
            Some(ComponentState::Mounted),
        ];
        assert_eq!(reduce_states(&a, any_error_table), ReturnCode::TargetError);
        assert_eq!(reduce_states(&b, any_error_table), ReturnCode::TargetError);

        let ext = vec![Some(ComponentState::External), Some(ComponentState::Mounted)];
        assert_eq!(reduce_states(&ext, any_error_table), ReturnCode::External);

        assert_eq!(
            reduce_states(&[Some(ComponentState::Offline)], any_error_table),
            ReturnCode::Ok
        );
    }
}
