//! Remote Dispatch Facility
//!
//! Fans one command line out to a set of nodes and delivers output lines
//! and exit codes back as an asynchronous event stream. Concurrency across
//! nodes lives entirely here; the orchestrator drains one stream on one
//! task and never spawns per-node threads of its own.
//!
//! Per-node output ordering is preserved (one node's lines arrive in
//! emission order); nothing is guaranteed across different nodes.

pub mod ssh;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::mpsc;

pub use ssh::{SshConfig, SshDispatcher};

// =============================================================================
// Node Set
// =============================================================================

/// An ordered, deduplicated set of host names.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeSet(BTreeSet<String>);

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: impl Into<String>) {
        self.0.insert(node.into());
    }

    pub fn contains(&self, node: &str) -> bool {
        self.0.contains(node)
    }

    pub fn is_subset(&self, other: &NodeSet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Nodes of `self` that are not in `other`.
    pub fn difference(&self, other: &NodeSet) -> NodeSet {
        NodeSet(self.0.difference(&other.0).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl std::fmt::Display for NodeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for node in &self.0 {
            if !first {
                write!(f, ",")?;
            }
            f.write_str(node)?;
            first = false;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for NodeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        NodeSet(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Dispatch Events
// =============================================================================

/// Synthetic exit code reported when a node's command could not even be
/// spawned locally.
pub const SPAWN_FAILURE_RC: i32 = 127;

/// Asynchronous callbacks of the dispatch facility, delivered as a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// One line of standard output from one node.
    OutputLine { node: String, line: String },
    /// One node's process exited. Exactly one per node per submission.
    Exited { node: String, code: i32 },
}

// =============================================================================
// Remote Dispatcher Port
// =============================================================================

/// Port for the concurrent remote-execution facility.
///
/// One submission fans the same command out to every node of the set. The
/// returned channel carries [`DispatchEvent`]s until one `Exited` has been
/// delivered per node, then closes; draining it to closure is the
/// run-until-quiescent point of an invocation.
#[async_trait]
pub trait RemoteDispatcher: Send + Sync {
    async fn submit(
        &self,
        command: &str,
        nodes: &NodeSet,
    ) -> Result<mpsc::Receiver<DispatchEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodeset_ordering_and_display() {
        let nodes: NodeSet = ["nas2", "nas1", "nas2", "web3"].into_iter().collect();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.to_string(), "nas1,nas2,web3");
    }

    #[test]
    fn test_nodeset_difference() {
        let managed: NodeSet = ["nas1", "nas2"].into_iter().collect();
        let requested: NodeSet = ["nas2", "web9"].into_iter().collect();
        let outside = requested.difference(&managed);
        assert_eq!(outside.to_string(), "web9");
        assert!(!requested.is_subset(&managed));
    }
}
