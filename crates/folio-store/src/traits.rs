use async_trait::async_trait;
use folio_types::{ObjectId, RepoCoordinates};

use crate::error::StoreResult;
use crate::object::{BlobContent, PullRequest, PullRequestSpec, TreeEntry};

/// Client for a remote, content-addressed git object store.
///
/// Each method is one round trip to the hosting platform and suspends the
/// caller until it answers or the configured timeout elapses. The client
/// never interprets repository contents beyond what each call returns.
///
/// Implementations must be `Send + Sync`; one client instance serves one
/// request and holds that request's resolved credential.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Resolve a branch name to the id of its tip commit.
    ///
    /// Fails with `NotFound` when the branch does not exist.
    async fn resolve_branch_head(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
    ) -> StoreResult<ObjectId>;

    /// Read the root tree id of a commit.
    async fn read_commit_tree(
        &self,
        coords: &RepoCoordinates,
        commit: &ObjectId,
    ) -> StoreResult<ObjectId>;

    /// Create a tree from `base_tree` plus `entries`.
    ///
    /// Paths not named in `entries` are inherited from the base tree by the
    /// remote; they are never enumerated by the client.
    async fn create_tree(
        &self,
        coords: &RepoCoordinates,
        base_tree: &ObjectId,
        entries: &[TreeEntry],
    ) -> StoreResult<ObjectId>;

    /// Create a commit object with a single parent.
    async fn create_commit(
        &self,
        coords: &RepoCoordinates,
        tree: &ObjectId,
        parent: &ObjectId,
        message: &str,
    ) -> StoreResult<ObjectId>;

    /// Move `branch` to `commit`.
    ///
    /// When `expected` is given the update only succeeds while the branch
    /// still points at it; otherwise the call fails with `Conflict`.
    async fn update_branch_head(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
        commit: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> StoreResult<()>;

    /// Create a new ref `refs/heads/<branch>` pointing at `commit`.
    async fn create_branch(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
        commit: &ObjectId,
    ) -> StoreResult<()>;

    /// Remove the ref `refs/heads/<branch>`.
    async fn delete_branch(&self, coords: &RepoCoordinates, branch: &str) -> StoreResult<()>;

    /// Open a pull request merging `spec.head` into `spec.base`.
    async fn open_pull_request(
        &self,
        coords: &RepoCoordinates,
        spec: &PullRequestSpec,
    ) -> StoreResult<PullRequest>;

    /// Read a file by repository-relative path.
    async fn read_blob(&self, coords: &RepoCoordinates, path: &str) -> StoreResult<BlobContent>;

    /// Create or replace a file. `content` is base64-encoded.
    ///
    /// `previous` is the content id obtained from [`read_blob`]; the remote
    /// rejects the write with `Conflict` when it is stale. Pass `None` only
    /// when creating a file that does not exist yet. Returns the new
    /// content id.
    ///
    /// [`read_blob`]: ObjectStoreClient::read_blob
    async fn write_blob(
        &self,
        coords: &RepoCoordinates,
        path: &str,
        content: &str,
        previous: Option<&ObjectId>,
        message: &str,
    ) -> StoreResult<ObjectId>;

    /// Delete a file, guarded by its current content id.
    async fn delete_blob(
        &self,
        coords: &RepoCoordinates,
        path: &str,
        previous: &ObjectId,
        message: &str,
    ) -> StoreResult<()>;
}
