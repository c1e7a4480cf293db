//! High-level API for Folio.
//!
//! [`Folio`] is the entry point applications embed. It resolves which
//! credential and content root a project uses, runs commits and folder-tree
//! operations against the project's repository, keeps track of editing
//! branches, and tells a project's viewers whenever its content changes.

pub mod config;
pub mod error;
pub mod folio;
pub mod stores;

pub use config::FolioConfig;
pub use error::{SdkError, SdkResult};
pub use folio::Folio;
pub use stores::{GithubStoreFactory, SharedStoreFactory, StoreFactory};

// Re-export key types
pub use folio_notify::{ConnectionId, Delivery, RoomEvent, RoomMember, Subscription, Update};
pub use folio_pipeline::{CommitOutcome, PublishRequest};
pub use folio_refs::{EditingSession, MAIN_BRANCH};
pub use folio_store::{
    AccessToken, CredentialProvider, ProjectContext, PullRequest, StaticCredentialProvider, StoreError,
};
pub use folio_tree::{FileDocument, FolderNode, FolderSnapshot};
pub use folio_types::{AccountKind, Edit, NodeId, ObjectId, ProjectId, RepoCoordinates, UserId};
