//! Target Components
//!
//! A target is a storage-role component: one backing device on one server,
//! optionally with a separate journal device and failover servers.

use crate::component::{Component, ComponentState, Role};

impl Component {
    /// Build a target component.
    pub fn new_target(
        role: Role,
        tag: impl Into<String>,
        server: impl Into<String>,
        index: u32,
        device: impl Into<String>,
    ) -> Self {
        assert!(role.is_target(), "client role used for a target component");
        let mut comp = Self::base(tag, role, server);
        comp.index = Some(index);
        comp.device = Some(device.into());
        comp
    }

    /// Attach a journal device.
    pub fn with_journal(mut self, journal_device: impl Into<String>) -> Self {
        self.journal_device = Some(journal_device.into());
        self
    }

    /// Add a failover server after the primary.
    pub fn with_failover(mut self, server: impl Into<String>) -> Self {
        self.servers.push(server.into());
        self
    }

    /// Mark this target as managed by another authority. Externally
    /// managed targets report their state but are never acted upon.
    pub fn with_external(mut self) -> Self {
        self.state = Some(ComponentState::External);
        self.enabled = false;
        self
    }
}
