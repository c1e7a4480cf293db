//! Opening a store client for a credential subject.

use std::fmt;
use std::sync::Arc;

use folio_store::{build_http_client, CredentialProvider, GithubObjectStore, ObjectStoreClient, StoreConfig};
use folio_types::UserId;

use crate::error::SdkResult;

/// Produces the store client that acts on behalf of one credential subject.
///
/// Called once per operation; the client lives for that operation only.
pub trait StoreFactory: Send + Sync {
    fn open(&self, subject: &UserId) -> SdkResult<Arc<dyn ObjectStoreClient>>;
}

/// Clients for the GitHub REST API sharing one connection pool.
pub struct GithubStoreFactory {
    http: reqwest::Client,
    config: StoreConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl GithubStoreFactory {
    pub fn new(config: StoreConfig, credentials: Arc<dyn CredentialProvider>) -> SdkResult<Self> {
        let http = build_http_client(&config)?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }
}

impl StoreFactory for GithubStoreFactory {
    fn open(&self, subject: &UserId) -> SdkResult<Arc<dyn ObjectStoreClient>> {
        Ok(Arc::new(GithubObjectStore::with_client(
            self.http.clone(),
            self.config.clone(),
            Arc::clone(&self.credentials),
            subject.clone(),
        )))
    }
}

impl fmt::Debug for GithubStoreFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubStoreFactory")
            .field("api_base", &self.config.api_base())
            .finish()
    }
}

/// Hands out the same client to every subject. For tests and local runs
/// against an in-memory store.
#[derive(Clone)]
pub struct SharedStoreFactory {
    store: Arc<dyn ObjectStoreClient>,
}

impl SharedStoreFactory {
    pub fn new(store: Arc<dyn ObjectStoreClient>) -> Self {
        Self { store }
    }
}

impl StoreFactory for SharedStoreFactory {
    fn open(&self, _subject: &UserId) -> SdkResult<Arc<dyn ObjectStoreClient>> {
        Ok(Arc::clone(&self.store))
    }
}
