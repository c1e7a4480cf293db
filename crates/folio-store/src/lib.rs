//! Remote object store access for Folio.
//!
//! Folio keeps every document in a repository on a git hosting platform and
//! talks to it only through the platform's object API. This crate wraps
//! those calls behind the [`ObjectStoreClient`] trait and supplies the
//! pieces every request needs to reach the right repository with the right
//! credential.
//!
//! # Clients
//!
//! - [`GithubObjectStore`] -- the hosting platform's REST API over `reqwest`
//! - [`InMemoryObjectStore`] -- a coherent in-process git model that records
//!   every call and can fail on demand; used by tests across the workspace
//!
//! # Design Rules
//!
//! 1. One client serves one request and one credential subject.
//! 2. No call is retried, except a single replay after a credential refresh.
//! 3. Blob content crosses the boundary base64-encoded, exactly as stored.
//! 4. Optimistic-concurrency failures surface as [`StoreError::Conflict`].

pub mod backend;
pub mod config;
pub mod credentials;
pub mod error;
pub mod github;
pub mod memory;
pub mod object;
pub mod traits;
mod wire;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::{
    backend_for, ContentLayout, GithubBackend, GoogleBackend, ProjectContext, StorageBackend,
};
pub use config::StoreConfig;
pub use credentials::{AccessToken, CredentialProvider, StaticCredentialProvider};
pub use error::{StoreError, StoreResult};
pub use github::{build_http_client, GithubObjectStore};
pub use memory::{InMemoryObjectStore, StoreCall, StoreOp};
pub use object::{
    decode_base64, encode_base64, BlobContent, EntryKind, EntryMode, PullRequest,
    PullRequestSpec, TreeEntry,
};
pub use traits::ObjectStoreClient;
