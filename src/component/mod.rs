//! Component State Machine
//!
//! Canonical states and transition rules shared by every manageable
//! resource of a filesystem: storage target roles and client mounts.
//!
//! States form a total severity order used for worst-state-wins
//! aggregation. Transitions only happen as the side effect of a health
//! check classifying live status, or of an action completing.

pub mod client;
pub mod target;

use crate::action::{ActionResult, ActionStatus, Operation};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Component State
// =============================================================================

/// State of a manageable component.
///
/// Variant order is the severity order (least severe first); `Ord` is the
/// worst-state-wins aggregation rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    /// Quiescent, not started/mounted.
    Offline,
    /// Healthy and serving.
    Mounted,
    /// Started and replaying, not yet fully serving.
    Recovering,
    /// Managed by another authority; must not be acted upon.
    External,
    /// Client-side protocol inconsistency.
    ClientError,
    /// On-disk / target-level fault.
    TargetError,
    /// The check or action itself could not complete; true state unknown.
    RuntimeError,
}

impl std::fmt::Display for ComponentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentState::Offline => write!(f, "offline"),
            ComponentState::Mounted => write!(f, "mounted"),
            ComponentState::Recovering => write!(f, "recovering"),
            ComponentState::External => write!(f, "external"),
            ComponentState::ClientError => write!(f, "client error"),
            ComponentState::TargetError => write!(f, "target error"),
            ComponentState::RuntimeError => write!(f, "check failure"),
        }
    }
}

impl ComponentState {
    /// Whether this is one of the error states.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ComponentState::ClientError
                | ComponentState::TargetError
                | ComponentState::RuntimeError
        )
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Role of a component within the filesystem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Management target.
    Mgt,
    /// Metadata target.
    Mdt,
    /// Object storage target.
    Ost,
    /// Client mount.
    Client,
}

impl Role {
    pub fn is_target(&self) -> bool {
        !matches!(self, Role::Client)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mgt => "mgt",
            Role::Mdt => "mdt",
            Role::Ost => "ost",
            Role::Client => "client",
        }
    }

    /// Error state matching this role's fault domain.
    pub fn error_state(&self) -> ComponentState {
        if self.is_target() {
            ComponentState::TargetError
        } else {
            ComponentState::ClientError
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mgt" => Ok(Role::Mgt),
            "mdt" => Ok(Role::Mdt),
            "ost" => Ok(Role::Ost),
            "client" => Ok(Role::Client),
            other => Err(Error::EnvelopeDecode(format!("unknown role '{}'", other))),
        }
    }
}

// =============================================================================
// Health Probe Port
// =============================================================================

/// Live status classification of one component.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Classified state.
    pub state: ComponentState,
    /// Role-specific detail (observed mount point, recovery progress, ...).
    pub detail: Option<String>,
}

/// Port for the component-specific health probes.
///
/// Probes read operating-system state (proc tables, device nodes) and
/// classify it; they are inputs to the state machine, not part of it. An
/// internally inconsistent condition is returned as
/// [`Error::Component`] carrying both the error state and an explanation.
pub trait HealthProbe: Send + Sync {
    fn probe(&self, component: &Component) -> Result<ProbeReport>;
}

// =============================================================================
// Component
// =============================================================================

/// A manageable cluster resource: one storage target role or one client
/// mount, with its own state and action bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Stable unique tag, e.g. `fs1-OST0000` or `fs1-client-web3`.
    pub tag: String,
    /// Role within the filesystem.
    pub role: Role,
    /// Hosting server; first entry is the primary.
    pub servers: Vec<String>,
    /// Target index, for target roles.
    pub index: Option<u32>,
    /// Current state; `None` until first classified.
    pub state: Option<ComponentState>,
    /// Whether this component participates in the current run.
    pub enabled: bool,

    /// Backing device (targets).
    pub device: Option<String>,
    /// Journal device (targets).
    pub journal_device: Option<String>,
    /// Configured mount path (clients).
    pub mount_path: Option<String>,
    /// Mount options (clients).
    pub mount_options: Option<String>,
    /// Role-specific auxiliary status detail, for diagnostics only.
    pub status_info: Option<String>,

    /// Status of the action currently or last bound to this component.
    pub action_status: ActionStatus,
    /// Name of the last action run on this component.
    pub last_action: Option<Operation>,
    /// Result of the last completed action.
    pub last_result: Option<ActionResult>,
}

impl Component {
    fn base(tag: impl Into<String>, role: Role, server: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role,
            servers: vec![server.into()],
            index: None,
            state: None,
            enabled: true,
            device: None,
            journal_device: None,
            mount_path: None,
            mount_options: None,
            status_info: None,
            action_status: ActionStatus::NotStarted,
            last_action: None,
            last_result: None,
        }
    }

    /// Primary hosting server.
    pub fn primary_server(&self) -> &str {
        &self.servers[0]
    }

    /// Operations this component declares support for.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Format => self.role.is_target(),
            Operation::Mount | Operation::Umount | Operation::Status => true,
        }
    }

    /// Whether an action is currently in flight.
    pub fn action_running(&self) -> bool {
        self.action_status == ActionStatus::Running
    }

    /// Begin an action on this component.
    ///
    /// Panics if an action is already running: the single-action invariant
    /// is a programming discipline, not a user-facing failure.
    pub fn start_action(&mut self, operation: Operation) {
        assert!(
            !self.action_running(),
            "action '{}' started on '{}' while '{:?}' still running",
            operation,
            self.tag,
            self.last_action,
        );
        self.action_status = ActionStatus::Running;
        self.last_action = Some(operation);
    }

    /// Finalize the running action as done.
    ///
    /// `new_state` overrides the operation's default success state when the
    /// outcome carries a fresher classification (status checks do).
    pub fn action_done(
        &mut self,
        operation: Operation,
        result: ActionResult,
        new_state: Option<ComponentState>,
    ) {
        assert!(
            self.action_running(),
            "action '{}' completed on '{}' but none was running",
            operation,
            self.tag,
        );
        if let Some(state) = new_state.or_else(|| operation.success_state()) {
            self.state = Some(state);
        }
        self.action_status = ActionStatus::Done;
        self.last_result = Some(result);
    }

    /// Finalize the running action as failed.
    ///
    /// The component state must already reflect the error (set by the
    /// check that raised, or by the caller from a decoded failure event);
    /// this only closes the bookkeeping.
    pub fn action_failed(&mut self, operation: Operation, result: ActionResult) {
        assert!(
            self.action_running(),
            "action '{}' failed on '{}' but none was running",
            operation,
            self.tag,
        );
        self.action_status = ActionStatus::Failed;
        self.last_result = Some(result);
    }

    /// Run a health check, replacing the state unconditionally.
    ///
    /// On a probe error the matching error state is applied together with
    /// the explanation before the error is returned.
    pub fn health_check(&mut self, probe: &dyn HealthProbe) -> Result<()> {
        match probe.probe(self) {
            Ok(report) => {
                self.state = Some(report.state);
                if report.detail.is_some() {
                    self.status_info = report.detail;
                }
                Ok(())
            }
            Err(err) => {
                self.state = Some(
                    err.component_state()
                        .unwrap_or(ComponentState::RuntimeError),
                );
                self.status_info = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Result<ProbeReport>);

    impl HealthProbe for FixedProbe {
        fn probe(&self, _component: &Component) -> Result<ProbeReport> {
            match &self.0 {
                Ok(r) => Ok(r.clone()),
                Err(Error::Component { state, message }) => Err(Error::Component {
                    state: *state,
                    message: message.clone(),
                }),
                Err(_) => unreachable!(),
            }
        }
    }

    #[test]
    fn test_state_severity_order() {
        assert!(ComponentState::Offline < ComponentState::Mounted);
        assert!(ComponentState::Mounted < ComponentState::Recovering);
        assert!(ComponentState::Recovering < ComponentState::External);
        assert!(ComponentState::External < ComponentState::ClientError);
        assert!(ComponentState::ClientError < ComponentState::TargetError);
        assert!(ComponentState::TargetError < ComponentState::RuntimeError);
    }

    #[test]
    fn test_action_lifecycle_transitions() {
        let mut comp = Component::new_target(Role::Ost, "fs1-OST0000", "nas1", 0, "/dev/sdb");
        assert_eq!(comp.action_status, ActionStatus::NotStarted);

        comp.start_action(Operation::Format);
        assert!(comp.action_running());

        comp.action_done(
            Operation::Format,
            ActionResult::message("formatted"),
            None,
        );
        assert_eq!(comp.action_status, ActionStatus::Done);
        assert_eq!(comp.state, Some(ComponentState::Offline));
        assert_eq!(comp.last_action, Some(Operation::Format));
    }

    #[test]
    #[should_panic(expected = "still running")]
    fn test_double_start_is_a_defect() {
        let mut comp = Component::new_target(Role::Ost, "fs1-OST0000", "nas1", 0, "/dev/sdb");
        comp.start_action(Operation::Format);
        comp.start_action(Operation::Format);
    }

    #[test]
    fn test_health_check_replaces_state() {
        let mut comp =
            Component::new_client("fs1-client-web3", "web3", "/mnt/fs1", None);
        comp.state = Some(ComponentState::Offline);

        let probe = FixedProbe(Ok(ProbeReport {
            state: ComponentState::Mounted,
            detail: Some("/mnt/fs1".into()),
        }));
        comp.health_check(&probe).unwrap();
        assert_eq!(comp.state, Some(ComponentState::Mounted));
        assert_eq!(comp.status_info.as_deref(), Some("/mnt/fs1"));
    }

    #[test]
    fn test_health_check_error_sets_state_and_message() {
        let mut comp =
            Component::new_client("fs1-client-web3", "web3", "/mnt/fs1", None);

        let probe = FixedProbe(Err(Error::client("conflicting mounts detected")));
        let err = comp.health_check(&probe).unwrap_err();
        assert_eq!(comp.state, Some(ComponentState::ClientError));
        assert_eq!(
            comp.status_info.as_deref(),
            Some("conflicting mounts detected")
        );
        assert_eq!(err.component_state(), Some(ComponentState::ClientError));
    }

    #[test]
    fn test_supports() {
        let target = Component::new_target(Role::Mdt, "fs1-MDT0000", "mds1", 0, "/dev/sda");
        let client = Component::new_client("fs1-client-web3", "web3", "/mnt/fs1", None);
        assert!(target.supports(Operation::Format));
        assert!(!client.supports(Operation::Format));
        assert!(client.supports(Operation::Mount));
        assert!(client.supports(Operation::Status));
    }
}
