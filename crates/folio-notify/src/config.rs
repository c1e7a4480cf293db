use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, NotifyResult};

/// Configuration for the notification hub.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// How long a long-poll waiter blocks before giving up, in seconds.
    pub long_poll_timeout_secs: u64,
    /// Per-connection queue of undelivered room events. Events beyond it
    /// are dropped for that connection.
    pub room_buffer: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            long_poll_timeout_secs: 300,
            room_buffer: 64,
        }
    }
}

impl NotifyConfig {
    pub fn long_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.long_poll_timeout_secs)
    }

    pub fn validate(&self) -> NotifyResult<()> {
        if self.long_poll_timeout_secs == 0 {
            return Err(NotifyError::InvalidConfig(
                "long_poll_timeout_secs must be positive".into(),
            ));
        }
        if self.room_buffer == 0 {
            return Err(NotifyError::InvalidConfig("room_buffer must be positive".into()));
        }
        Ok(())
    }
}
