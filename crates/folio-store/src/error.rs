//! Error taxonomy for remote object store operations.

use thiserror::Error;

/// Errors from object store operations.
///
/// Every variant is surfaced verbatim to the caller; the store performs no
/// retries except the single credential refresh on `Unauthorized`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A ref, commit, tree or blob does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credential was rejected or has expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An optimistic-concurrency precondition failed: a blob's content id or
    /// a branch head moved since it was read.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success response from the hosting platform.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure before any response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The credential collaborator could not produce a token.
    #[error("credential error: {0}")]
    Credential(String),

    #[error("invalid store config: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// `true` for the error a caller should answer with reload-and-retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
