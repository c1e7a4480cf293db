use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for remote object store clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the hosting platform's REST API.
    pub api_base: String,
    /// `User-Agent` header; the platform rejects requests without one.
    pub user_agent: String,
    /// Upper bound on a single remote call, in seconds.
    pub request_timeout_secs: u64,
    /// Repository directory under which Folio keeps its documents.
    pub content_root: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".into(),
            user_agent: concat!("folio/", env!("CARGO_PKG_VERSION")).into(),
            request_timeout_secs: 30,
            content_root: "folio".into(),
        }
    }
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// API base without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(StoreError::InvalidConfig(
                "request_timeout_secs must be positive".into(),
            ));
        }
        if self.api_base().is_empty() {
            return Err(StoreError::InvalidConfig("api_base must be set".into()));
        }
        Ok(())
    }
}
