//! Client Components
//!
//! A client is a filesystem mount on a compute node: it has a configured
//! mount point, optional mount options, and per-connection state counts
//! that probes feed back for diagnostics.

use crate::component::{Component, Role};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

impl Component {
    /// Build a client component for one node.
    pub fn new_client(
        tag: impl Into<String>,
        server: impl Into<String>,
        mount_path: impl Into<String>,
        mount_options: Option<&str>,
    ) -> Self {
        let mut comp = Self::base(tag, Role::Client, server);
        comp.mount_path = Some(mount_path.into());
        comp.mount_options = mount_options.map(str::to_string);
        comp
    }

    /// Filesystem-and-mount-point label used in client diagnostics.
    pub fn client_label(&self, fs_name: &str) -> String {
        format!(
            "{} on {}",
            fs_name,
            self.mount_path.as_deref().unwrap_or("?")
        )
    }
}

/// Classify per-connection state counts observed by a client probe.
///
/// Evicted connections are a client error; anything else is left to the
/// probe's own mount-table classification.
pub fn check_connection_states(states: &BTreeMap<String, u32>) -> Result<()> {
    if let Some(evicted) = states.get("EVICTED") {
        if *evicted > 0 {
            return Err(Error::client(format!(
                "client connection error ({} evictions)",
                evicted
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentState;

    #[test]
    fn test_client_construction() {
        let comp = Component::new_client(
            "fs1-client-web3",
            "web3",
            "/mnt/fs1",
            Some("ro,flock"),
        );
        assert_eq!(comp.role, Role::Client);
        assert_eq!(comp.mount_path.as_deref(), Some("/mnt/fs1"));
        assert_eq!(comp.mount_options.as_deref(), Some("ro,flock"));
        assert_eq!(comp.client_label("fs1"), "fs1 on /mnt/fs1");
        assert_eq!(comp.role.error_state(), ComponentState::ClientError);
    }

    #[test]
    fn test_evictions_classify_as_client_error() {
        let mut states = BTreeMap::new();
        states.insert("FULL".to_string(), 7);
        assert!(check_connection_states(&states).is_ok());

        states.insert("EVICTED".to_string(), 2);
        let err = check_connection_states(&states).unwrap_err();
        assert_eq!(err.component_state(), Some(ComponentState::ClientError));
        assert!(err.to_string().contains("2 evictions"));
    }
}
