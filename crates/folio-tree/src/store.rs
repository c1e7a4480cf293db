//! Persisting the folder hierarchy and its file blobs.
//!
//! The whole hierarchy lives in one blob. Every mutation is a
//! read-modify-write of that blob guarded by its content id: a concurrent
//! writer makes the save fail with a conflict instead of being silently
//! overwritten, and the caller reloads and reapplies.

use folio_store::{encode_base64, ContentLayout, ObjectStoreClient, StoreError};
use folio_types::{NodeId, ObjectId, RepoCoordinates};
use tracing::{debug, info};

use crate::codec;
use crate::error::{TreeError, TreeResult};
use crate::node::{self, FolderNode};

/// Content written for a newly inserted node: an empty editor document.
pub const STARTER_DOCUMENT: &str = "{}";

/// A loaded hierarchy and the content id to save it back against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderSnapshot {
    pub tree: Vec<FolderNode>,
    pub content_id: ObjectId,
}

/// Result of a node operation: the tree as it now stands and whether the
/// operation wrote anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeEdit {
    pub snapshot: FolderSnapshot,
    pub changed: bool,
}

impl NodeEdit {
    fn unchanged(snapshot: FolderSnapshot) -> Self {
        Self {
            snapshot,
            changed: false,
        }
    }

    fn saved(tree: Vec<FolderNode>, content_id: ObjectId) -> Self {
        Self {
            snapshot: FolderSnapshot { tree, content_id },
            changed: true,
        }
    }
}

/// The content of one node's file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDocument {
    pub node: NodeId,
    pub content: String,
    pub content_id: ObjectId,
}

/// Folder tree and file storage for one project.
pub struct FolderTreeStore<'a> {
    store: &'a dyn ObjectStoreClient,
    coords: &'a RepoCoordinates,
    layout: ContentLayout,
}

impl<'a> FolderTreeStore<'a> {
    pub fn new(store: &'a dyn ObjectStoreClient, coords: &'a RepoCoordinates, layout: ContentLayout) -> Self {
        Self { store, coords, layout }
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }

    /// Read and decode the folder document.
    pub async fn load(&self) -> TreeResult<FolderSnapshot> {
        let blob = self.store.read_blob(self.coords, &self.layout.folder_document()).await?;
        let tree = codec::decode(&blob.content)?;
        debug!(repo = %self.coords, nodes = node::all_ids(&tree).len(), "folder tree loaded");
        Ok(FolderSnapshot {
            tree,
            content_id: blob.content_id,
        })
    }

    /// Write `tree` back, provided the stored document still has content id
    /// `previous`. Returns the new content id.
    pub async fn save(&self, tree: &[FolderNode], previous: &ObjectId) -> TreeResult<ObjectId> {
        let encoded = codec::encode(tree)?;
        let id = self
            .store
            .write_blob(
                self.coords,
                &self.layout.folder_document(),
                &encoded,
                Some(previous),
                "Update folder structure",
            )
            .await?;
        debug!(repo = %self.coords, content_id = id.short_hex(), "folder tree saved");
        Ok(id)
    }

    /// Create an empty folder document for a newly provisioned project.
    pub async fn initialize(&self) -> TreeResult<ObjectId> {
        let encoded = codec::encode(&[])?;
        let id = self
            .store
            .write_blob(
                self.coords,
                &self.layout.folder_document(),
                &encoded,
                None,
                "Create folder structure",
            )
            .await?;
        info!(repo = %self.coords, root = self.layout.root(), "folder tree initialized");
        Ok(id)
    }

    /// Add `node` under `parent` (or at the root), then create its file.
    ///
    /// An unknown parent or an id already in the tree changes nothing and
    /// writes nothing.
    pub async fn insert_node(&self, parent: Option<&NodeId>, node: FolderNode) -> TreeResult<NodeEdit> {
        validate_name(&node.name)?;
        let snapshot = self.load().await?;
        let id = node.id;
        let tree = node::insert(&snapshot.tree, parent, node);
        if tree == snapshot.tree {
            debug!(repo = %self.coords, node = %id, "insert left tree unchanged");
            return Ok(NodeEdit::unchanged(snapshot));
        }
        let content_id = self.save(&tree, &snapshot.content_id).await?;
        self.store
            .write_blob(
                self.coords,
                &self.layout.file(&id),
                &encode_base64(STARTER_DOCUMENT.as_bytes()),
                None,
                &format!("Create file {id}"),
            )
            .await?;
        info!(repo = %self.coords, node = %id, "node inserted");
        Ok(NodeEdit::saved(tree, content_id))
    }

    /// Rename a node. An unknown id changes nothing and writes nothing.
    pub async fn rename_node(&self, id: &NodeId, name: &str) -> TreeResult<NodeEdit> {
        validate_name(name)?;
        let snapshot = self.load().await?;
        if !node::contains(&snapshot.tree, id) {
            return Ok(NodeEdit::unchanged(snapshot));
        }
        let tree = node::rename(&snapshot.tree, id, name);
        let content_id = self.save(&tree, &snapshot.content_id).await?;
        info!(repo = %self.coords, node = %id, name, "node renamed");
        Ok(NodeEdit::saved(tree, content_id))
    }

    /// Remove a node and its subtree, deleting their files first.
    ///
    /// Files go in depth-first post-order, so an interrupted delete never
    /// leaves a file whose ancestors are already gone. Nodes without a file
    /// are skipped. The tree is saved only after every file is deleted.
    pub async fn delete_node(&self, id: &NodeId) -> TreeResult<NodeEdit> {
        let snapshot = self.load().await?;
        let Some(target) = node::find(&snapshot.tree, id) else {
            return Ok(NodeEdit::unchanged(snapshot));
        };
        let doomed = node::post_order(target);
        for node_id in &doomed {
            self.delete_file(node_id).await?;
        }
        let tree = node::delete(&snapshot.tree, id);
        let content_id = self.save(&tree, &snapshot.content_id).await?;
        info!(repo = %self.coords, node = %id, removed = doomed.len(), "node deleted");
        Ok(NodeEdit::saved(tree, content_id))
    }

    async fn delete_file(&self, id: &NodeId) -> TreeResult<()> {
        let path = self.layout.file(id);
        let current = match self.store.read_blob(self.coords, &path).await {
            Ok(blob) => blob.content_id,
            Err(StoreError::NotFound(_)) => {
                debug!(repo = %self.coords, node = %id, "no file to delete");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        self.store
            .delete_blob(self.coords, &path, &current, &format!("Delete file {id}"))
            .await?;
        Ok(())
    }

    /// Read a node's file as text.
    pub async fn read_file(&self, id: &NodeId) -> TreeResult<FileDocument> {
        let blob = self.store.read_blob(self.coords, &self.layout.file(id)).await?;
        let bytes = blob.decode()?;
        let content = String::from_utf8(bytes).map_err(|e| TreeError::Codec(e.to_string()))?;
        Ok(FileDocument {
            node: *id,
            content,
            content_id: blob.content_id,
        })
    }

    /// Replace a node's file, guarded by the content id from
    /// [`read_file`](Self::read_file). Returns the new content id.
    pub async fn write_file(&self, id: &NodeId, content: &str, previous: Option<&ObjectId>) -> TreeResult<ObjectId> {
        let new_id = self
            .store
            .write_blob(
                self.coords,
                &self.layout.file(id),
                &encode_base64(content.as_bytes()),
                previous,
                &format!("Update file {id}"),
            )
            .await?;
        debug!(repo = %self.coords, node = %id, content_id = new_id.short_hex(), "file written");
        Ok(new_id)
    }
}

fn validate_name(name: &str) -> TreeResult<()> {
    if name.trim().is_empty() {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}
