#![forbid(unsafe_code)]

//! Engine error type.

use thiserror::Error;

use crate::tree::BoxId;

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure of a tree operation.
///
/// Every variant is raised before the tree is mutated, so a failed operation
/// leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The identifier does not resolve to a box in the tree.
    #[error("box {id} not found")]
    NodeNotFound { id: BoxId },

    /// The request itself is malformed.
    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// The box kind cannot take part in the requested operation.
    #[error("{kind} box {id} does not support {operation}")]
    UnsupportedNodeKind {
        id: BoxId,
        kind: &'static str,
        operation: &'static str,
    },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// The box the error refers to, if any.
    #[must_use]
    pub const fn box_id(&self) -> Option<BoxId> {
        match self {
            Self::NodeNotFound { id } | Self::UnsupportedNodeKind { id, .. } => Some(*id),
            Self::InvalidOperation { .. } => None,
        }
    }
}
