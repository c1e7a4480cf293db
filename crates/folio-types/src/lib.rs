//! Foundation types for Folio.
//!
//! Folio stores collaboratively edited documents in a hosted git repository.
//! This crate holds the small value types every other Folio crate shares.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- hex content hash of a remote git object (commit, tree, blob)
//! - [`RepoCoordinates`] -- owner + repository name of a project's storage
//! - [`AccountKind`] -- which storage account flavor backs a project
//! - [`ProjectId`], [`UserId`], [`NodeId`] -- application identifiers
//! - [`Edit`] / [`Change`] -- one path-level change fed to the commit pipeline

pub mod coords;
pub mod edit;
pub mod error;
pub mod ids;
pub mod object;

pub use coords::{AccountKind, RepoCoordinates};
pub use edit::{Change, Edit, DELETE_SENTINEL};
pub use error::TypeError;
pub use ids::{NodeId, ProjectId, UserId};
pub use object::ObjectId;
