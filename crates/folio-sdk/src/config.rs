use folio_notify::NotifyConfig;
use folio_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::SdkResult;

/// Configuration of a [`Folio`](crate::Folio) instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub store: StoreConfig,
    pub notify: NotifyConfig,
}

impl FolioConfig {
    pub fn validate(&self) -> SdkResult<()> {
        self.store.validate()?;
        self.notify.validate()?;
        Ok(())
    }
}
