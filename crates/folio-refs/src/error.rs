//! Error types for branch naming and editing sessions.

use thiserror::Error;

/// Errors that can occur when naming or registering an editing branch.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RefError {
    /// The branch name breaks git's ref naming rules.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The name belongs to the shared main line and cannot be used for a
    /// private editing branch.
    #[error("branch name is reserved: {name}")]
    ReservedBranch { name: String },
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
