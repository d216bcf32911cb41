//! Error types for the ClusterFS orchestrator
//!
//! Provides structured error types for all orchestrator layers: operation
//! validation, component health classification, the proxy message protocol,
//! remote dispatch, and the configuration collaborator.

use crate::component::ComponentState;
use thiserror::Error;

/// Unified error type for the orchestrator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("No filesystem matched: {0}")]
    FilesystemNotFound(String),

    #[error("Nodes {nodes} are not part of filesystem '{fs_name}' for operation '{operation}'")]
    NodesOutsideFilesystem {
        fs_name: String,
        operation: String,
        nodes: String,
    },

    #[error("No component of '{fs_name}' supports operation '{operation}'")]
    NoComponentSupports { fs_name: String, operation: String },

    // =========================================================================
    // Component Errors
    // =========================================================================
    #[error("{message}")]
    Component {
        /// Error state the failing check classified the component into.
        state: ComponentState,
        message: String,
    },

    // =========================================================================
    // Proxy Protocol Errors
    // =========================================================================
    #[error("Envelope decode error: {0}")]
    EnvelopeDecode(String),

    // =========================================================================
    // Remote Dispatch Errors
    // =========================================================================
    #[error("Dispatch failed for '{command}': {reason}")]
    Dispatch { command: String, reason: String },

    // =========================================================================
    // Configuration Collaborator Errors
    // =========================================================================
    #[error("Configuration backend error: {0}")]
    ConfigBackend(String),
}

impl Error {
    /// Build a component error for a client-side inconsistency.
    pub fn client(message: impl Into<String>) -> Self {
        Error::Component {
            state: ComponentState::ClientError,
            message: message.into(),
        }
    }

    /// Build a component error for a target-level fault.
    pub fn target(message: impl Into<String>) -> Self {
        Error::Component {
            state: ComponentState::TargetError,
            message: message.into(),
        }
    }

    /// Build a component error for a check that could not complete.
    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Component {
            state: ComponentState::RuntimeError,
            message: message.into(),
        }
    }

    /// Error state carried by a component error, if any.
    pub fn component_state(&self) -> Option<ComponentState> {
        match self {
            Error::Component { state, .. } => Some(*state),
            _ => None,
        }
    }

    /// Whether this error aborts an operation before any remote dispatch.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::FilesystemNotFound(_)
                | Error::NodesOutsideFilesystem { .. }
                | Error::NoComponentSupports { .. }
        )
    }
}

/// Result type alias for the orchestrator
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_error_carries_state() {
        let err = Error::client("conflicting mounts detected");
        assert_eq!(err.component_state(), Some(ComponentState::ClientError));
        assert_eq!(err.to_string(), "conflicting mounts detected");

        let err = Error::runtime("probe crashed");
        assert_eq!(err.component_state(), Some(ComponentState::RuntimeError));
    }

    #[test]
    fn test_validation_classification() {
        let err = Error::NodesOutsideFilesystem {
            fs_name: "fs1".into(),
            operation: "format".into(),
            nodes: "web3,web4".into(),
        };
        assert!(err.is_validation());

        let err = Error::EnvelopeDecode("missing prefix".into());
        assert!(!err.is_validation());
    }
}
