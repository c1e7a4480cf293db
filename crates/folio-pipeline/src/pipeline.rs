//! Advancing a branch by one commit.
//!
//! A commit is five remote calls executed strictly in order, each feeding
//! the next:
//!
//! ```text
//! resolve-head -> resolve-base-tree -> build-tree -> create-commit -> advance-ref
//! ```
//!
//! Only the last call has an externally visible effect. A failure anywhere
//! before it leaves the branch where it was; the tree or commit objects
//! already created stay unreferenced on the remote and are collected there.
//! Nothing is rolled back and nothing is retried.

use std::future::Future;
use std::time::{Duration, Instant};

use folio_store::{ObjectStoreClient, StoreResult, TreeEntry};
use folio_types::{Edit, ObjectId, RepoCoordinates};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::stage::{PipelineStage, StageRecord};

/// Everything a successful commit produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    pub branch: String,
    /// Head the branch pointed at before the commit; the new commit's parent.
    pub previous_head: ObjectId,
    pub base_tree: ObjectId,
    pub tree: ObjectId,
    pub commit: ObjectId,
    /// Per-stage timings in execution order.
    pub stages: Vec<StageRecord>,
    pub elapsed: Duration,
}

/// Runs commits against one repository.
pub struct CommitPipeline<'a> {
    store: &'a dyn ObjectStoreClient,
    coords: &'a RepoCoordinates,
}

impl<'a> CommitPipeline<'a> {
    pub fn new(store: &'a dyn ObjectStoreClient, coords: &'a RepoCoordinates) -> Self {
        Self { store, coords }
    }

    pub fn coords(&self) -> &RepoCoordinates {
        self.coords
    }

    /// Commit `edits` on top of `branch`.
    ///
    /// The branch must exist. The final ref update carries the head resolved
    /// in the first stage, so a concurrent commit landing in between fails
    /// this one with a conflict instead of being overwritten.
    pub async fn run(&self, branch: &str, edits: &[Edit], message: &str) -> PipelineResult<CommitOutcome> {
        if edits.is_empty() {
            return Err(PipelineError::NoEdits);
        }

        let started = Instant::now();
        let mut stages = Vec::with_capacity(PipelineStage::ALL.len());
        let coords = self.coords;
        debug!(repo = %coords, branch, edits = edits.len(), "commit started");

        let head = timed(
            PipelineStage::ResolveHead,
            &mut stages,
            self.store.resolve_branch_head(coords, branch),
        )
        .await?;

        let base_tree = timed(
            PipelineStage::ResolveBaseTree,
            &mut stages,
            self.store.read_commit_tree(coords, &head),
        )
        .await?;

        let entries = build_entries(edits);
        let tree = timed(
            PipelineStage::BuildTree,
            &mut stages,
            self.store.create_tree(coords, &base_tree, &entries),
        )
        .await?;

        let commit = timed(
            PipelineStage::CreateCommit,
            &mut stages,
            self.store.create_commit(coords, &tree, &head, message),
        )
        .await?;

        timed(
            PipelineStage::AdvanceRef,
            &mut stages,
            self.store.update_branch_head(coords, branch, &commit, Some(&head)),
        )
        .await?;

        let elapsed = started.elapsed();
        info!(
            repo = %coords,
            branch,
            parent = head.short_hex(),
            commit = commit.short_hex(),
            elapsed_ms = elapsed.as_millis() as u64,
            "branch advanced"
        );

        Ok(CommitOutcome {
            branch: branch.to_string(),
            previous_head: head,
            base_tree,
            tree,
            commit,
            stages,
            elapsed,
        })
    }
}

/// Translate edits into tree entries, one per edit, in order.
///
/// Deletions become entries without content; they are never dropped.
pub fn build_entries(edits: &[Edit]) -> Vec<TreeEntry> {
    edits.iter().map(TreeEntry::from).collect()
}

async fn timed<T, F>(stage: PipelineStage, records: &mut Vec<StageRecord>, call: F) -> PipelineResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    let started = Instant::now();
    let result = call.await;
    let elapsed = started.elapsed();
    match result {
        Ok(value) => {
            debug!(%stage, elapsed_ms = elapsed.as_millis() as u64, "stage complete");
            records.push(StageRecord { stage, elapsed });
            Ok(value)
        }
        Err(source) => {
            warn!(%stage, error = %source, "commit aborted");
            Err(PipelineError::Stage { stage, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use folio_store::{InMemoryObjectStore, StoreCall, StoreError, StoreOp};
    use folio_types::DELETE_SENTINEL;

    use super::*;

    fn coords() -> RepoCoordinates {
        RepoCoordinates::new("acme", "docs")
    }

    fn ops(store: &InMemoryObjectStore) -> Vec<StoreOp> {
        store.calls().iter().map(StoreCall::op).collect()
    }

    // -----------------------------------------------------------------------
    // Sequencing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn stages_run_in_order_on_the_resolved_base_tree() {
        let store = InMemoryObjectStore::new();
        let (c1, t1) = store.seed_repo(&coords(), &[("a.json", "old")]);
        let repo = coords();
        let pipeline = CommitPipeline::new(&store, &repo);

        let outcome = pipeline
            .run("main", &[Edit::write("a.json", "new")], "edit a")
            .await
            .unwrap();

        assert_eq!(
            ops(&store),
            vec![
                StoreOp::ResolveBranchHead,
                StoreOp::ReadCommitTree,
                StoreOp::CreateTree,
                StoreOp::CreateCommit,
                StoreOp::UpdateBranchHead,
            ]
        );
        let calls = store.calls();
        assert_eq!(calls[1], StoreCall::ReadCommitTree { commit: c1.clone() });
        match &calls[2] {
            StoreCall::CreateTree { base_tree, .. } => assert_eq!(base_tree, &t1),
            other => panic!("unexpected call: {other:?}"),
        }
        assert_eq!(
            calls[4],
            StoreCall::UpdateBranchHead {
                branch: "main".into(),
                commit: outcome.commit.clone(),
                expected: Some(c1.clone()),
            }
        );

        let stages: Vec<PipelineStage> = outcome.stages.iter().map(|r| r.stage).collect();
        assert_eq!(stages, PipelineStage::ALL.to_vec());
        assert_eq!(outcome.previous_head, c1);
        assert_eq!(outcome.base_tree, t1);
    }

    #[tokio::test]
    async fn delete_marker_becomes_blob_entry_without_content() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[("gone.json", "x"), ("keep.json", "k")]);
        let edit = Edit::from_changed_content("gone.json", None, DELETE_SENTINEL);

        CommitPipeline::new(&store, &coords())
            .run("main", &[edit], "remove")
            .await
            .unwrap();

        let calls = store.calls();
        let StoreCall::CreateTree { entries, .. } = &calls[2] else {
            panic!("expected create-tree, got {:?}", calls[2]);
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], TreeEntry::remove("gone.json"));
        assert_eq!(store.paths(&coords(), "main"), vec!["keep.json".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_branch_aborts_after_first_call() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[]);

        let err = CommitPipeline::new(&store, &coords())
            .run("nope", &[Edit::write("a", "b")], "m")
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::ResolveHead));
        assert!(err.store_error().is_some_and(StoreError::is_not_found));
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn failure_at_any_stage_leaves_branch_unmoved() {
        let failing = [
            (StoreOp::ResolveBranchHead, PipelineStage::ResolveHead),
            (StoreOp::ReadCommitTree, PipelineStage::ResolveBaseTree),
            (StoreOp::CreateTree, PipelineStage::BuildTree),
            (StoreOp::CreateCommit, PipelineStage::CreateCommit),
            (StoreOp::UpdateBranchHead, PipelineStage::AdvanceRef),
        ];
        for (k, (op, stage)) in failing.into_iter().enumerate() {
            let store = InMemoryObjectStore::new();
            let (c1, _) = store.seed_repo(&coords(), &[("x.json", "v1")]);
            store.fail_next(
                op,
                StoreError::Remote {
                    status: 500,
                    message: "boom".into(),
                },
            );

            let err = CommitPipeline::new(&store, &coords())
                .run("main", &[Edit::write("x.json", "v2")], "m")
                .await
                .unwrap_err();

            assert_eq!(err.stage(), Some(stage));
            assert_eq!(store.calls().len(), k + 1, "{stage}");
            assert_eq!(store.head(&coords(), "main"), Some(c1));
            assert_eq!(store.file(&coords(), "main", "x.json").as_deref(), Some("v1"));
        }
    }

    #[tokio::test]
    async fn concurrent_advance_is_a_conflict() {
        let store = InMemoryObjectStore::new();
        let (c1, _) = store.seed_repo(&coords(), &[("x.json", "v1")]);
        // Prepare a commit that another writer will land on main mid-run.
        store.create_branch(&coords(), "other", &c1).await.unwrap();
        let c2 = store.commit_file(&coords(), "other", "y.json", "theirs").unwrap();
        store.move_branch_before(StoreOp::UpdateBranchHead, &coords(), "main", c2.clone());
        store.clear_calls();

        let err = CommitPipeline::new(&store, &coords())
            .run("main", &[Edit::write("x.json", "mine")], "m")
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(err.stage(), Some(PipelineStage::AdvanceRef));
        assert_eq!(store.head(&coords(), "main"), Some(c2));
        assert_eq!(store.file(&coords(), "main", "x.json").as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn empty_edit_list_makes_no_calls() {
        let store = InMemoryObjectStore::new();
        store.seed_repo(&coords(), &[]);
        let err = CommitPipeline::new(&store, &coords())
            .run("main", &[], "m")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoEdits));
        assert!(store.calls().is_empty());
    }

    // -----------------------------------------------------------------------
    // End to end
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_inherits_unrelated_paths_structurally() {
        let store = InMemoryObjectStore::new();
        let (c1, t1) = store.seed_repo(&coords(), &[("x.json", "v1"), ("notes/y.json", "y")]);

        let outcome = CommitPipeline::new(&store, &coords())
            .run("main", &[Edit::write("x.json", "v2")], "update x")
            .await
            .unwrap();

        let calls = store.calls();
        let StoreCall::CreateTree { base_tree, entries } = &calls[2] else {
            panic!("expected create-tree, got {:?}", calls[2]);
        };
        assert_eq!(base_tree, &t1);
        assert_eq!(entries, &vec![TreeEntry::write("x.json", "v2")]);

        assert_eq!(store.head(&coords(), "main"), Some(outcome.commit.clone()));
        assert_eq!(store.commit_parents(&coords(), &outcome.commit), vec![c1]);
        assert_eq!(
            store.commit_message(&coords(), &outcome.commit).as_deref(),
            Some("update x")
        );
        assert_eq!(store.file(&coords(), "main", "x.json").as_deref(), Some("v2"));
        assert_eq!(store.file(&coords(), "main", "notes/y.json").as_deref(), Some("y"));
    }

    #[test]
    fn entries_keep_edit_order() {
        let edits = [Edit::write("b", "1"), Edit::delete("a"), Edit::write("c", "2")];
        let paths: Vec<String> = build_entries(&edits).into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["b", "a", "c"]);
    }
}
