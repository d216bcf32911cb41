//! Action Lifecycle
//!
//! Gives every administrative operation a uniform start/finish protocol,
//! whether it executes locally on one node or is proxied across many.

pub mod local;
pub mod proxy;

use crate::component::ComponentState;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Operations
// =============================================================================

/// Administrative operations driven through the action lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Format,
    Mount,
    Umount,
    Status,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Format => "format",
            Operation::Mount => "mount",
            Operation::Umount => "umount",
            Operation::Status => "status",
        }
    }

    /// Component state applied when this operation completes successfully.
    ///
    /// `None` means the outcome must carry its own classification (status
    /// checks report what the probe observed rather than implying a state).
    pub fn success_state(&self) -> Option<ComponentState> {
        match self {
            Operation::Format => Some(ComponentState::Offline),
            Operation::Mount => Some(ComponentState::Mounted),
            Operation::Umount => Some(ComponentState::Offline),
            Operation::Status => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "format" => Ok(Operation::Format),
            "mount" => Ok(Operation::Mount),
            "umount" => Ok(Operation::Umount),
            "status" => Ok(Operation::Status),
            other => Err(Error::EnvelopeDecode(format!(
                "unknown operation '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// Action Status
// =============================================================================

/// Status of one action bound to one component.
///
/// Monotonic and one-directional: `NotStarted` → `Running` → `Done` or
/// `Failed`, never reversed, never repeated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    NotStarted,
    Running,
    Done,
    Failed,
}

impl ActionStatus {
    /// Whether the action has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Done | ActionStatus::Failed)
    }
}

// =============================================================================
// Action Result
// =============================================================================

/// Outcome payload carried by a completed or failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Human-readable outcome message.
    pub message: String,
    /// Return code reported by the remote process, when there was one.
    pub remote_rc: Option<i32>,
    /// When the outcome was recorded.
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl ActionResult {
    pub fn new(message: impl Into<String>, remote_rc: Option<i32>) -> Self {
        Self {
            message: message.into(),
            remote_rc,
            recorded_at: chrono::Utc::now(),
        }
    }

    /// Result carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_operation_round_trip() {
        for op in [
            Operation::Format,
            Operation::Mount,
            Operation::Umount,
            Operation::Status,
        ] {
            assert_eq!(Operation::from_str(op.as_str()).unwrap(), op);
        }
        assert!(Operation::from_str("reformat").is_err());
    }

    #[test]
    fn test_success_states() {
        assert_eq!(
            Operation::Mount.success_state(),
            Some(ComponentState::Mounted)
        );
        assert_eq!(
            Operation::Umount.success_state(),
            Some(ComponentState::Offline)
        );
        assert_eq!(Operation::Status.success_state(), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ActionStatus::NotStarted.is_terminal());
        assert!(!ActionStatus::Running.is_terminal());
        assert!(ActionStatus::Done.is_terminal());
        assert!(ActionStatus::Failed.is_terminal());
    }
}
