//! In-memory object store.
//!
//! A small but coherent git model: refs point at commits, commits point at
//! flat trees, trees map paths to blobs. The path-addressed blob calls act
//! on the default branch and commit every change, just as the hosting
//! platform's contents API does.
//!
//! Every call is appended to a log before it executes, and any operation can
//! be made to fail once, so tests can assert on call order and on partial
//! failure.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use folio_types::{ObjectId, RepoCoordinates};

use crate::error::{StoreError, StoreResult};
use crate::object::{decode_base64, encode_base64, BlobContent, PullRequest, PullRequestSpec, TreeEntry};
use crate::traits::ObjectStoreClient;

/// Operation kinds, used to target injected failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ResolveBranchHead,
    ReadCommitTree,
    CreateTree,
    CreateCommit,
    UpdateBranchHead,
    CreateBranch,
    DeleteBranch,
    OpenPullRequest,
    ReadBlob,
    WriteBlob,
    DeleteBlob,
}

/// One recorded call with the arguments that matter for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    ResolveBranchHead {
        branch: String,
    },
    ReadCommitTree {
        commit: ObjectId,
    },
    CreateTree {
        base_tree: ObjectId,
        entries: Vec<TreeEntry>,
    },
    CreateCommit {
        tree: ObjectId,
        parent: ObjectId,
        message: String,
    },
    UpdateBranchHead {
        branch: String,
        commit: ObjectId,
        expected: Option<ObjectId>,
    },
    CreateBranch {
        branch: String,
        commit: ObjectId,
    },
    DeleteBranch {
        branch: String,
    },
    OpenPullRequest {
        spec: PullRequestSpec,
    },
    ReadBlob {
        path: String,
    },
    WriteBlob {
        path: String,
        previous: Option<ObjectId>,
    },
    DeleteBlob {
        path: String,
        previous: ObjectId,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            Self::ResolveBranchHead { .. } => StoreOp::ResolveBranchHead,
            Self::ReadCommitTree { .. } => StoreOp::ReadCommitTree,
            Self::CreateTree { .. } => StoreOp::CreateTree,
            Self::CreateCommit { .. } => StoreOp::CreateCommit,
            Self::UpdateBranchHead { .. } => StoreOp::UpdateBranchHead,
            Self::CreateBranch { .. } => StoreOp::CreateBranch,
            Self::DeleteBranch { .. } => StoreOp::DeleteBranch,
            Self::OpenPullRequest { .. } => StoreOp::OpenPullRequest,
            Self::ReadBlob { .. } => StoreOp::ReadBlob,
            Self::WriteBlob { .. } => StoreOp::WriteBlob,
            Self::DeleteBlob { .. } => StoreOp::DeleteBlob,
        }
    }
}

#[derive(Clone, Debug)]
struct CommitRecord {
    tree: ObjectId,
    parents: Vec<ObjectId>,
    message: String,
}

#[derive(Default)]
struct Repo {
    refs: BTreeMap<String, ObjectId>,
    commits: HashMap<ObjectId, CommitRecord>,
    trees: HashMap<ObjectId, BTreeMap<String, ObjectId>>,
    blobs: HashMap<ObjectId, Vec<u8>>,
    pulls: Vec<(PullRequestSpec, PullRequest)>,
}

struct BranchMove {
    before: StoreOp,
    repo: String,
    branch: String,
    commit: ObjectId,
}

#[derive(Default)]
struct State {
    repos: HashMap<String, Repo>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, StoreError>,
    moves: Vec<BranchMove>,
    sequence: u64,
}

impl State {
    /// Record the call, apply any scheduled branch move, then consume an
    /// injected failure for the operation.
    fn enter(&mut self, call: StoreCall) -> StoreResult<()> {
        let op = call.op();
        self.calls.push(call);
        if let Some(pos) = self.moves.iter().position(|m| m.before == op) {
            let m = self.moves.remove(pos);
            if let Some(repo) = self.repos.get_mut(&m.repo) {
                repo.refs.insert(m.branch, m.commit);
            }
        }
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

impl Repo {
    fn head(&self, branch: &str) -> StoreResult<ObjectId> {
        self.refs
            .get(branch)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("branch {branch}")))
    }

    fn commit(&self, id: &ObjectId) -> StoreResult<&CommitRecord> {
        self.commits
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("commit {}", id.short_hex())))
    }

    fn tree(&self, id: &ObjectId) -> StoreResult<&BTreeMap<String, ObjectId>> {
        self.trees
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("tree {}", id.short_hex())))
    }

    fn put_blob(&mut self, data: Vec<u8>) -> ObjectId {
        let mut keyed = b"blob\0".to_vec();
        keyed.extend_from_slice(&data);
        let id = ObjectId::digest(&keyed);
        self.blobs.insert(id.clone(), data);
        id
    }

    fn put_tree(&mut self, entries: BTreeMap<String, ObjectId>) -> ObjectId {
        let mut keyed = b"tree\0".to_vec();
        for (path, blob) in &entries {
            keyed.extend_from_slice(path.as_bytes());
            keyed.push(0);
            keyed.extend_from_slice(blob.as_str().as_bytes());
            keyed.push(b'\n');
        }
        let id = ObjectId::digest(&keyed);
        self.trees.insert(id.clone(), entries);
        id
    }

    fn put_commit(&mut self, record: CommitRecord, sequence: u64) -> ObjectId {
        let mut text = format!("commit\0{sequence}\ntree {}\n", record.tree);
        for parent in &record.parents {
            text.push_str(&format!("parent {parent}\n"));
        }
        text.push('\n');
        text.push_str(&record.message);
        let id = ObjectId::digest(text.as_bytes());
        self.commits.insert(id.clone(), record);
        id
    }

    fn is_ancestor(&self, ancestor: &ObjectId, of: &ObjectId) -> bool {
        let mut stack = vec![of.clone()];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if &id == ancestor {
                return true;
            }
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(record) = self.commits.get(&id) {
                stack.extend(record.parents.iter().cloned());
            }
        }
        false
    }

    /// Files of the tree at the tip of `branch`.
    fn branch_files(&self, branch: &str) -> StoreResult<(ObjectId, BTreeMap<String, ObjectId>)> {
        let head = self.head(branch)?;
        let tree = self.commit(&head)?.tree.clone();
        Ok((head, self.tree(&tree)?.clone()))
    }
}

/// Object store held entirely in memory.
///
/// Repositories must be created with [`seed_repo`](Self::seed_repo) before
/// use; calls against an unknown repository fail with `NotFound`.
pub struct InMemoryObjectStore {
    state: Mutex<State>,
    default_branch: String,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::with_default_branch("main")
    }

    pub fn with_default_branch(branch: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            default_branch: branch.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a repository whose default branch holds one root commit with
    /// `files` (path, UTF-8 content). Returns the commit and its tree.
    pub fn seed_repo(&self, coords: &RepoCoordinates, files: &[(&str, &str)]) -> (ObjectId, ObjectId) {
        let mut state = self.lock();
        let sequence = state.next_sequence();
        let repo = state.repos.entry(coords.slug()).or_default();
        let mut entries = BTreeMap::new();
        for (path, content) in files {
            let blob = repo.put_blob(content.as_bytes().to_vec());
            entries.insert((*path).to_string(), blob);
        }
        let tree = repo.put_tree(entries);
        let commit = repo.put_commit(
            CommitRecord {
                tree: tree.clone(),
                parents: Vec::new(),
                message: "initial commit".into(),
            },
            sequence,
        );
        repo.refs.insert(self.default_branch.clone(), commit.clone());
        (commit, tree)
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.lock().failures.insert(op, error);
    }

    /// Move `branch` to `commit` just before the next call of `op` runs,
    /// simulating a concurrent writer.
    pub fn move_branch_before(&self, op: StoreOp, coords: &RepoCoordinates, branch: &str, commit: ObjectId) {
        self.lock().moves.push(BranchMove {
            before: op,
            repo: coords.slug(),
            branch: branch.to_string(),
            commit,
        });
    }

    pub fn head(&self, coords: &RepoCoordinates, branch: &str) -> Option<ObjectId> {
        let state = self.lock();
        state.repos.get(&coords.slug())?.refs.get(branch).cloned()
    }

    /// Commit a single file change on `branch` outside the call log.
    pub fn commit_file(&self, coords: &RepoCoordinates, branch: &str, path: &str, content: &str) -> Option<ObjectId> {
        let mut state = self.lock();
        let sequence = state.next_sequence();
        let repo = state.repos.get_mut(&coords.slug())?;
        let (head, mut files) = repo.branch_files(branch).ok()?;
        let blob = repo.put_blob(content.as_bytes().to_vec());
        files.insert(path.to_string(), blob);
        let tree = repo.put_tree(files);
        let commit = repo.put_commit(
            CommitRecord {
                tree,
                parents: vec![head],
                message: format!("update {path}"),
            },
            sequence,
        );
        repo.refs.insert(branch.to_string(), commit.clone());
        Some(commit)
    }

    /// UTF-8 content of `path` at the tip of `branch`.
    pub fn file(&self, coords: &RepoCoordinates, branch: &str, path: &str) -> Option<String> {
        let state = self.lock();
        let repo = state.repos.get(&coords.slug())?;
        let (_, files) = repo.branch_files(branch).ok()?;
        let data = repo.blobs.get(files.get(path)?)?;
        Some(String::from_utf8_lossy(data).into_owned())
    }

    /// Sorted file paths at the tip of `branch`.
    pub fn paths(&self, coords: &RepoCoordinates, branch: &str) -> Vec<String> {
        let state = self.lock();
        state
            .repos
            .get(&coords.slug())
            .and_then(|repo| repo.branch_files(branch).ok())
            .map(|(_, files)| files.into_keys().collect())
            .unwrap_or_default()
    }

    pub fn commit_parents(&self, coords: &RepoCoordinates, commit: &ObjectId) -> Vec<ObjectId> {
        let state = self.lock();
        state
            .repos
            .get(&coords.slug())
            .and_then(|repo| repo.commits.get(commit))
            .map(|record| record.parents.clone())
            .unwrap_or_default()
    }

    pub fn commit_message(&self, coords: &RepoCoordinates, commit: &ObjectId) -> Option<String> {
        let state = self.lock();
        let record = state.repos.get(&coords.slug())?.commits.get(commit)?;
        Some(record.message.clone())
    }

    pub fn pull_requests(&self, coords: &RepoCoordinates) -> Vec<(PullRequestSpec, PullRequest)> {
        let state = self.lock();
        state
            .repos
            .get(&coords.slug())
            .map(|repo| repo.pulls.clone())
            .unwrap_or_default()
    }

    /// Commit a contents-API change on the default branch.
    fn commit_contents(
        &self,
        state: &mut State,
        coords: &RepoCoordinates,
        files: BTreeMap<String, ObjectId>,
        parent: ObjectId,
        message: &str,
    ) -> StoreResult<()> {
        let sequence = state.next_sequence();
        let repo = repo_mut(state, coords)?;
        let tree = repo.put_tree(files);
        let commit = repo.put_commit(
            CommitRecord {
                tree,
                parents: vec![parent],
                message: message.to_string(),
            },
            sequence,
        );
        repo.refs.insert(self.default_branch.clone(), commit);
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("InMemoryObjectStore")
            .field("repos", &state.repos.len())
            .field("calls", &state.calls.len())
            .field("default_branch", &self.default_branch)
            .finish()
    }
}

fn repo_ref<'a>(state: &'a State, coords: &RepoCoordinates) -> StoreResult<&'a Repo> {
    state
        .repos
        .get(&coords.slug())
        .ok_or_else(|| StoreError::NotFound(format!("repository {coords}")))
}

fn repo_mut<'a>(state: &'a mut State, coords: &RepoCoordinates) -> StoreResult<&'a mut Repo> {
    state
        .repos
        .get_mut(&coords.slug())
        .ok_or_else(|| StoreError::NotFound(format!("repository {coords}")))
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn resolve_branch_head(&self, coords: &RepoCoordinates, branch: &str) -> StoreResult<ObjectId> {
        let mut state = self.lock();
        state.enter(StoreCall::ResolveBranchHead {
            branch: branch.to_string(),
        })?;
        repo_ref(&state, coords)?.head(branch)
    }

    async fn read_commit_tree(&self, coords: &RepoCoordinates, commit: &ObjectId) -> StoreResult<ObjectId> {
        let mut state = self.lock();
        state.enter(StoreCall::ReadCommitTree {
            commit: commit.clone(),
        })?;
        Ok(repo_ref(&state, coords)?.commit(commit)?.tree.clone())
    }

    async fn create_tree(
        &self,
        coords: &RepoCoordinates,
        base_tree: &ObjectId,
        entries: &[TreeEntry],
    ) -> StoreResult<ObjectId> {
        let mut state = self.lock();
        state.enter(StoreCall::CreateTree {
            base_tree: base_tree.clone(),
            entries: entries.to_vec(),
        })?;
        let repo = repo_mut(&mut state, coords)?;
        let mut files = repo.tree(base_tree)?.clone();
        for entry in entries {
            match &entry.content {
                Some(content) => {
                    let blob = repo.put_blob(content.as_bytes().to_vec());
                    files.insert(entry.path.clone(), blob);
                }
                None => {
                    files.remove(&entry.path);
                }
            }
        }
        Ok(repo.put_tree(files))
    }

    async fn create_commit(
        &self,
        coords: &RepoCoordinates,
        tree: &ObjectId,
        parent: &ObjectId,
        message: &str,
    ) -> StoreResult<ObjectId> {
        let mut state = self.lock();
        state.enter(StoreCall::CreateCommit {
            tree: tree.clone(),
            parent: parent.clone(),
            message: message.to_string(),
        })?;
        let sequence = state.next_sequence();
        let repo = repo_mut(&mut state, coords)?;
        repo.tree(tree)?;
        repo.commit(parent)?;
        Ok(repo.put_commit(
            CommitRecord {
                tree: tree.clone(),
                parents: vec![parent.clone()],
                message: message.to_string(),
            },
            sequence,
        ))
    }

    async fn update_branch_head(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
        commit: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> StoreResult<()> {
        let mut state = self.lock();
        state.enter(StoreCall::UpdateBranchHead {
            branch: branch.to_string(),
            commit: commit.clone(),
            expected: expected.cloned(),
        })?;
        let repo = repo_mut(&mut state, coords)?;
        let current = repo.head(branch)?;
        repo.commit(commit)?;
        if let Some(expected) = expected {
            if &current != expected {
                return Err(StoreError::Conflict(format!(
                    "branch {branch} moved from {} to {}",
                    expected.short_hex(),
                    current.short_hex()
                )));
            }
        }
        if !repo.is_ancestor(&current, commit) {
            return Err(StoreError::Conflict(format!(
                "update of {branch} to {} is not a fast forward",
                commit.short_hex()
            )));
        }
        repo.refs.insert(branch.to_string(), commit.clone());
        Ok(())
    }

    async fn create_branch(&self, coords: &RepoCoordinates, branch: &str, commit: &ObjectId) -> StoreResult<()> {
        let mut state = self.lock();
        state.enter(StoreCall::CreateBranch {
            branch: branch.to_string(),
            commit: commit.clone(),
        })?;
        let repo = repo_mut(&mut state, coords)?;
        if repo.refs.contains_key(branch) {
            return Err(StoreError::Conflict(format!("branch {branch} already exists")));
        }
        repo.commit(commit)?;
        repo.refs.insert(branch.to_string(), commit.clone());
        Ok(())
    }

    async fn delete_branch(&self, coords: &RepoCoordinates, branch: &str) -> StoreResult<()> {
        let mut state = self.lock();
        state.enter(StoreCall::DeleteBranch {
            branch: branch.to_string(),
        })?;
        let repo = repo_mut(&mut state, coords)?;
        repo.refs
            .remove(branch)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("branch {branch}")))
    }

    async fn open_pull_request(&self, coords: &RepoCoordinates, spec: &PullRequestSpec) -> StoreResult<PullRequest> {
        let mut state = self.lock();
        state.enter(StoreCall::OpenPullRequest { spec: spec.clone() })?;
        let repo = repo_mut(&mut state, coords)?;
        repo.head(&spec.head)?;
        repo.head(&spec.base)?;
        let number = repo.pulls.len() as u64 + 1;
        let pull = PullRequest {
            number,
            url: format!("memory://{}/pull/{number}", coords.slug()),
        };
        repo.pulls.push((spec.clone(), pull.clone()));
        Ok(pull)
    }

    async fn read_blob(&self, coords: &RepoCoordinates, path: &str) -> StoreResult<BlobContent> {
        let mut state = self.lock();
        state.enter(StoreCall::ReadBlob {
            path: path.to_string(),
        })?;
        let repo = repo_ref(&state, coords)?;
        let (_, files) = repo.branch_files(&self.default_branch)?;
        let id = files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(format!("file {path}")))?;
        let data = repo
            .blobs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("blob {}", id.short_hex())))?;
        Ok(BlobContent {
            path: path.to_string(),
            content: encode_base64(data),
            content_id: id.clone(),
        })
    }

    async fn write_blob(
        &self,
        coords: &RepoCoordinates,
        path: &str,
        content: &str,
        previous: Option<&ObjectId>,
        message: &str,
    ) -> StoreResult<ObjectId> {
        let mut state = self.lock();
        state.enter(StoreCall::WriteBlob {
            path: path.to_string(),
            previous: previous.cloned(),
        })?;
        let data = decode_base64(content)?;
        let repo = repo_mut(&mut state, coords)?;
        let (head, mut files) = repo.branch_files(&self.default_branch)?;
        if files.get(path) != previous {
            return Err(StoreError::Conflict(format!("{path} does not match the given content id")));
        }
        let blob = repo.put_blob(data);
        files.insert(path.to_string(), blob.clone());
        self.commit_contents(&mut state, coords, files, head, message)?;
        Ok(blob)
    }

    async fn delete_blob(
        &self,
        coords: &RepoCoordinates,
        path: &str,
        previous: &ObjectId,
        message: &str,
    ) -> StoreResult<()> {
        let mut state = self.lock();
        state.enter(StoreCall::DeleteBlob {
            path: path.to_string(),
            previous: previous.clone(),
        })?;
        let repo = repo_ref(&state, coords)?;
        let (head, mut files) = repo.branch_files(&self.default_branch)?;
        match files.remove(path) {
            None => return Err(StoreError::NotFound(format!("file {path}"))),
            Some(current) if &current != previous => {
                return Err(StoreError::Conflict(format!("{path} does not match the given content id")));
            }
            Some(_) => {}
        }
        self.commit_contents(&mut state, coords, files, head, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> RepoCoordinates {
        RepoCoordinates::new("acme", "docs")
    }

    // ---- refs and commits ----

    #[tokio::test]
    async fn seed_and_resolve() {
        let store = InMemoryObjectStore::new();
        let (commit, tree) = store.seed_repo(&coords(), &[("a.txt", "A")]);
        assert_eq!(store.resolve_branch_head(&coords(), "main").await.unwrap(), commit);
        assert_eq!(store.read_commit_tree(&coords(), &commit).await.unwrap(), tree);
        assert_eq!(store.file(&coords(), "main", "a.txt").as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn unknown_branch_and_repo_are_not_found() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[]);
        assert!(store.resolve_branch_head(&coords(), "nope").await.unwrap_err().is_not_found());
        let other = RepoCoordinates::new("acme", "other");
        assert!(store.resolve_branch_head(&other, "main").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn create_tree_inherits_base_and_applies_removals() {
        let store = InMemoryObjectStore::new();
        let (_, base) = store.seed_repo(&coords(), &[("keep", "k"), ("gone", "g")]);
        let tree = store
            .create_tree(&coords(), &base, &[TreeEntry::write("new", "n"), TreeEntry::remove("gone")])
            .await
            .unwrap();
        let head = store.head(&coords(), "main").unwrap();
        let commit = store.create_commit(&coords(), &tree, &head, "m").await.unwrap();
        store.update_branch_head(&coords(), "main", &commit, Some(&head)).await.unwrap();
        assert_eq!(store.paths(&coords(), "main"), vec!["keep".to_string(), "new".to_string()]);
        assert_eq!(store.commit_parents(&coords(), &commit), vec![head]);
    }

    #[tokio::test]
    async fn identical_trees_share_an_id() {
        let store = InMemoryObjectStore::new();
        let (_, base) = store.seed_repo(&coords(), &[("a", "1")]);
        let t1 = store.create_tree(&coords(), &base, &[TreeEntry::write("b", "2")]).await.unwrap();
        let t2 = store.create_tree(&coords(), &base, &[TreeEntry::write("b", "2")]).await.unwrap();
        assert_eq!(t1, t2);
    }

    #[tokio::test]
    async fn stale_expected_head_is_conflict() {
        let store = InMemoryObjectStore::new();
        let (root, tree) = store.seed_repo(&coords(), &[]);
        let moved = store.commit_file(&coords(), "main", "x", "1").unwrap();
        let mine = store.create_commit(&coords(), &tree, &root, "mine").await.unwrap();
        let err = store
            .update_branch_head(&coords(), "main", &mine, Some(&root))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.head(&coords(), "main"), Some(moved));
    }

    #[tokio::test]
    async fn non_fast_forward_is_conflict() {
        let store = InMemoryObjectStore::new();
        let (root, tree) = store.seed_repo(&coords(), &[]);
        store.commit_file(&coords(), "main", "x", "1").unwrap();
        let sibling = store.create_commit(&coords(), &tree, &root, "side").await.unwrap();
        let err = store.update_branch_head(&coords(), "main", &sibling, None).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn branch_create_and_delete() {
        let store = InMemoryObjectStore::new();
        let (root, _) = store.seed_repo(&coords(), &[]);
        store.create_branch(&coords(), "edit", &root).await.unwrap();
        assert!(store.create_branch(&coords(), "edit", &root).await.unwrap_err().is_conflict());
        store.delete_branch(&coords(), "edit").await.unwrap();
        assert!(store.delete_branch(&coords(), "edit").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn pull_requests_are_numbered() {
        let store = InMemoryObjectStore::new();
        let (root, _) = store.seed_repo(&coords(), &[]);
        store.create_branch(&coords(), "edit", &root).await.unwrap();
        let spec = PullRequestSpec {
            title: "t".into(),
            head: "edit".into(),
            base: "main".into(),
            body: None,
        };
        assert_eq!(store.open_pull_request(&coords(), &spec).await.unwrap().number, 1);
        assert_eq!(store.open_pull_request(&coords(), &spec).await.unwrap().number, 2);
        assert_eq!(store.pull_requests(&coords()).len(), 2);
    }

    // ---- blobs ----

    #[tokio::test]
    async fn blob_write_requires_current_content_id() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[]);
        let id = store
            .write_blob(&coords(), "f.json", &encode_base64(b"{}"), None, "create")
            .await
            .unwrap();
        let read = store.read_blob(&coords(), "f.json").await.unwrap();
        assert_eq!(read.content_id, id);
        assert_eq!(read.decode().unwrap(), b"{}");

        let err = store
            .write_blob(&coords(), "f.json", &encode_base64(b"[]"), None, "again")
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        store
            .write_blob(&coords(), "f.json", &encode_base64(b"[]"), Some(&id), "update")
            .await
            .unwrap();
        assert_eq!(store.file(&coords(), "main", "f.json").as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn blob_delete_checks_content_id() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[("f", "x")]);
        let id = store.read_blob(&coords(), "f").await.unwrap().content_id;
        let stale = ObjectId::digest(b"stale");
        assert!(store.delete_blob(&coords(), "f", &stale, "rm").await.unwrap_err().is_conflict());
        store.delete_blob(&coords(), "f", &id, "rm").await.unwrap();
        assert!(store.read_blob(&coords(), "f").await.unwrap_err().is_not_found());
    }

    // ---- recording and injection ----

    #[tokio::test]
    async fn calls_are_recorded_in_order() {
        let store = InMemoryObjectStore::new();
        let (root, _) = store.seed_repo(&coords(), &[]);
        store.resolve_branch_head(&coords(), "main").await.unwrap();
        store.read_commit_tree(&coords(), &root).await.unwrap();
        let ops: Vec<StoreOp> = store.calls().iter().map(StoreCall::op).collect();
        assert_eq!(ops, vec![StoreOp::ResolveBranchHead, StoreOp::ReadCommitTree]);
        store.clear_calls();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[]);
        store.fail_next(StoreOp::ResolveBranchHead, StoreError::Timeout("slow".into()));
        assert_eq!(
            store.resolve_branch_head(&coords(), "main").await,
            Err(StoreError::Timeout("slow".into()))
        );
        assert!(store.resolve_branch_head(&coords(), "main").await.is_ok());
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn scheduled_move_applies_before_op() {
        let store = InMemoryObjectStore::new();
        let (root, _) = store.seed_repo(&coords(), &[]);
        let other = store.commit_file(&coords(), "main", "x", "1").unwrap();
        store.update_branch_head(&coords(), "main", &other, None).await.unwrap();
        store.move_branch_before(StoreOp::ResolveBranchHead, &coords(), "main", root.clone());
        assert_eq!(store.resolve_branch_head(&coords(), "main").await.unwrap(), root);
    }
}
