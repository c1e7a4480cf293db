//! The virtual folder hierarchy of a Folio project.
//!
//! Users organise documents in folders that exist only as one JSON document
//! in the project's repository; the files themselves live flat under
//! `files/<node-id>.json`. This crate holds the hierarchy's data model, the
//! pure algorithms that reshape it, and [`FolderTreeStore`], which persists
//! both the hierarchy and the per-node files.
//!
//! # Modules
//!
//! - [`node`] -- [`FolderNode`] and insert / rename / delete / find
//! - [`codec`] -- JSON and base64 transfer form of the hierarchy
//! - [`store`] -- load, optimistic save, and node operations with file side
//!   effects

pub mod codec;
pub mod error;
pub mod node;
pub mod store;

pub use error::{TreeError, TreeResult};
pub use node::FolderNode;
pub use store::{FileDocument, FolderSnapshot, FolderTreeStore, NodeEdit, STARTER_DOCUMENT};
