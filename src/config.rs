//! Configuration Collaborator Port
//!
//! The orchestrator reads per-role format/mount parameters from, and
//! reports status transitions to, an external configuration backend. The
//! calls are opaque notifications; how the backend stores them is not this
//! crate's concern. An in-memory implementation ships for tests and for
//! callers without a persistent backend.

use crate::component::Role;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

// =============================================================================
// Parameters
// =============================================================================

/// Per-role formatting parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatParams {
    /// Extra options passed to the remote mkfs invocation.
    pub mkfs_options: Option<String>,
    /// Default stripe count for the filesystem.
    pub stripe_count: Option<u32>,
    /// Default stripe size in bytes.
    pub stripe_size: Option<u64>,
    /// Whether quota support is enabled at format time.
    pub quota: bool,
    /// Quota type, when enabled.
    pub quota_type: Option<String>,
}

/// Client mount parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountParams {
    /// Mount point on client nodes.
    pub mount_path: String,
    /// Mount options.
    pub mount_options: Option<String>,
}

// =============================================================================
// Status Notifications
// =============================================================================

/// Filesystem-level status transitions reported to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsConfigStatus {
    Formatting,
    Formatted,
    FormatFailed,
    Online,
    Offline,
}

/// Per-component status transitions reported to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentConfigStatus {
    Formatting,
    Formatted,
    FormatFailed,
    Mounted,
    Unmounted,
}

// =============================================================================
// Port
// =============================================================================

/// Port to the external configuration backend.
pub trait FsConfigHandle: Send + Sync {
    /// Formatting parameters for one target role.
    fn format_params(&self, role: Role) -> FormatParams;

    /// Mount parameters for clients.
    fn mount_params(&self) -> MountParams;

    /// Record a filesystem-level status transition.
    fn set_fs_status(&self, status: FsConfigStatus) -> Result<()>;

    /// Record a component-level status transition.
    fn set_component_status(&self, tag: &str, status: ComponentConfigStatus) -> Result<()>;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory configuration backend; records every notification in order.
#[derive(Debug, Default)]
pub struct MemoryFsConfig {
    format_params: BTreeMap<Role, FormatParams>,
    mount_params: Option<MountParams>,
    fs_statuses: Mutex<Vec<FsConfigStatus>>,
    component_statuses: Mutex<Vec<(String, ComponentConfigStatus)>>,
}

impl MemoryFsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format_params(mut self, role: Role, params: FormatParams) -> Self {
        self.format_params.insert(role, params);
        self
    }

    pub fn with_mount_params(mut self, params: MountParams) -> Self {
        self.mount_params = Some(params);
        self
    }

    /// Filesystem status notifications received so far, in order.
    pub fn fs_statuses(&self) -> Vec<FsConfigStatus> {
        self.fs_statuses.lock().unwrap().clone()
    }

    /// Component status notifications received so far, in order.
    pub fn component_statuses(&self) -> Vec<(String, ComponentConfigStatus)> {
        self.component_statuses.lock().unwrap().clone()
    }
}

impl FsConfigHandle for MemoryFsConfig {
    fn format_params(&self, role: Role) -> FormatParams {
        self.format_params.get(&role).cloned().unwrap_or_default()
    }

    fn mount_params(&self) -> MountParams {
        self.mount_params.clone().unwrap_or(MountParams {
            mount_path: "/mnt/clusterfs".to_string(),
            mount_options: None,
        })
    }

    fn set_fs_status(&self, status: FsConfigStatus) -> Result<()> {
        self.fs_statuses.lock().unwrap().push(status);
        Ok(())
    }

    fn set_component_status(&self, tag: &str, status: ComponentConfigStatus) -> Result<()> {
        self.component_statuses
            .lock()
            .unwrap()
            .push((tag.to_string(), status));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_records_notifications() {
        let config = MemoryFsConfig::new();
        config.set_fs_status(FsConfigStatus::Formatting).unwrap();
        config
            .set_component_status("fs1-OST0000", ComponentConfigStatus::Formatted)
            .unwrap();
        config.set_fs_status(FsConfigStatus::Formatted).unwrap();

        assert_eq!(
            config.fs_statuses(),
            vec![FsConfigStatus::Formatting, FsConfigStatus::Formatted]
        );
        assert_eq!(
            config.component_statuses(),
            vec![("fs1-OST0000".to_string(), ComponentConfigStatus::Formatted)]
        );
    }

    #[test]
    fn test_format_params_default_per_role() {
        let config = MemoryFsConfig::new().with_format_params(
            Role::Ost,
            FormatParams {
                mkfs_options: Some("-m 0".into()),
                stripe_count: Some(4),
                ..Default::default()
            },
        );
        assert_eq!(config.format_params(Role::Ost).stripe_count, Some(4));
        assert_eq!(config.format_params(Role::Mdt), FormatParams::default());
    }
}
