use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid object id length: expected 40 or 64, got {actual}")]
    InvalidLength { actual: usize },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown account kind: {0}")]
    UnknownAccountKind(String),
}
