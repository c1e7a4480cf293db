use thiserror::Error;

/// Errors from building a notification hub.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid notification config: {0}")]
    InvalidConfig(String),
}

pub type NotifyResult<T> = std::result::Result<T, NotifyError>;
