use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use folio_notify::NotifyConfig;
use folio_sdk::{FolioConfig, ProjectContext, StaticCredentialProvider, UserId};
use folio_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    pub notify: NotifyConfig,
    pub credentials: CredentialsConfig,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    pub projects: Vec<ProjectContext>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            store: StoreConfig::default(),
            notify: NotifyConfig::default(),
            credentials: CredentialsConfig::default(),
            cors_origins: Vec::new(),
            projects: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.store.validate().map_err(|e| ServerError::Config(e.to_string()))?;
        config.notify.validate().map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn folio(&self) -> FolioConfig {
        FolioConfig {
            store: self.store.clone(),
            notify: self.notify.clone(),
        }
    }
}

/// Where the server finds hosting-platform tokens.
///
/// Tokens are never written in the config file itself; each entry names an
/// environment variable to read at startup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Variable holding the token used for users without their own entry.
    pub fallback_env: Option<String>,
    /// User id to variable name.
    pub users: BTreeMap<String, String>,
}

impl CredentialsConfig {
    pub fn provider(&self) -> ServerResult<StaticCredentialProvider> {
        self.provider_from(|name| std::env::var(name).ok())
    }

    pub fn provider_from(&self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<StaticCredentialProvider> {
        let read = |var: &str| lookup(var).ok_or_else(|| ServerError::Config(format!("environment variable {var} is not set")));
        let mut provider = StaticCredentialProvider::new();
        if let Some(var) = &self.fallback_env {
            provider = provider.with_fallback(read(var)?);
        }
        for (user, var) in &self.users {
            let user = UserId::new(user.as_str()).map_err(|e| ServerError::Config(e.to_string()))?;
            provider = provider.with_token(user, read(var)?);
        }
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use folio_sdk::{AccountKind, CredentialProvider};

    use super::*;

    const SAMPLE: &str = r#"
bind_addr = "0.0.0.0:9000"
cors_origins = ["http://localhost:5173"]

[store]
content_root = "docs"

[notify]
long_poll_timeout_secs = 60

[credentials]
fallback_env = "FOLIO_TOKEN"
users = { alice = "ALICE_TOKEN" }

[[projects]]
id = "00000000-0000-0000-0000-000000000001"
kind = "google"
owner = "alice"
coords = { owner = "acme", repo = "handbook" }
"#;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(c.projects.is_empty());
        assert_eq!(c.folio(), FolioConfig::default());
    }

    #[test]
    fn parses_full_file() {
        let c = ServerConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.store.content_root, "docs");
        assert_eq!(c.notify.long_poll_timeout_secs, 60);
        assert_eq!(c.projects.len(), 1);
        assert_eq!(c.projects[0].kind, AccountKind::Google);
        assert_eq!(c.projects[0].coords.slug(), "acme/handbook");
    }

    #[test]
    fn zero_store_timeout_is_config_error() {
        let err = ServerConfig::from_toml("[store]\nrequest_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn invalid_notify_section_is_config_error() {
        let err = ServerConfig::from_toml("[notify]\nroom_buffer = 0\n").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[tokio::test]
    async fn credentials_read_named_variables() {
        let c = ServerConfig::from_toml(SAMPLE).unwrap();
        let provider = c
            .credentials
            .provider_from(|name| match name {
                "FOLIO_TOKEN" => Some("shared".into()),
                "ALICE_TOKEN" => Some("alice-token".into()),
                _ => None,
            })
            .unwrap();
        let alice = provider.resolve(&UserId::new("alice").unwrap()).await.unwrap();
        assert_eq!(alice.secret(), "alice-token");
        let bob = provider.resolve(&UserId::new("bob").unwrap()).await.unwrap();
        assert_eq!(bob.secret(), "shared");
    }

    #[test]
    fn missing_variable_is_config_error() {
        let c = ServerConfig::from_toml(SAMPLE).unwrap();
        assert!(matches!(c.credentials.provider_from(|_| None), Err(ServerError::Config(_))));
    }
}
