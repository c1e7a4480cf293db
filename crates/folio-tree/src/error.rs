//! Error types for folder tree operations.

use folio_store::StoreError;
use thiserror::Error;

/// Errors from loading, saving or mutating the folder tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The stored folder document is not a valid node list.
    #[error("folder document is malformed: {0}")]
    Codec(String),

    /// A node name was empty or blank.
    #[error("invalid node name: {0:?}")]
    InvalidName(String),

    /// The remote store failed. A stale content id surfaces here as
    /// [`StoreError::Conflict`]; reload, reapply and save again.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TreeError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}

/// Convenience type alias for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;
