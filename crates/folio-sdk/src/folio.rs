use std::sync::Arc;

use folio_notify::{ConnectionId, Delivery, NotificationHub, RoomMember, Subscription, Update};
use folio_pipeline::{CommitOutcome, CommitPipeline, EditingBranches, PublishRequest};
use folio_refs::{EditingSession, EditingSessionRegistry, MAIN_BRANCH};
use folio_store::{backend_for, CredentialProvider, ObjectStoreClient, ProjectContext, PullRequest, StorageBackend};
use folio_tree::{FileDocument, FolderNode, FolderSnapshot, FolderTreeStore, NodeEdit};
use folio_types::{Edit, NodeId, ObjectId, ProjectId, UserId};
use tracing::{debug, info};

use crate::config::FolioConfig;
use crate::error::SdkResult;
use crate::stores::{GithubStoreFactory, StoreFactory};

/// High-level Folio API.
///
/// One instance serves the whole process. It owns the editing-session
/// registry and the notification hub; store clients are opened per call for
/// the credential subject the project's account type designates.
pub struct Folio {
    stores: Arc<dyn StoreFactory>,
    registry: EditingSessionRegistry,
    hub: NotificationHub,
    content_root: String,
}

/// The store client and backend resolved for one call.
struct Scope {
    store: Arc<dyn ObjectStoreClient>,
    backend: Box<dyn StorageBackend>,
}

impl Folio {
    /// Talk to the hosting platform configured in `config.store`.
    pub fn new(config: FolioConfig, credentials: Arc<dyn CredentialProvider>) -> SdkResult<Self> {
        config.validate()?;
        let factory = GithubStoreFactory::new(config.store.clone(), credentials)?;
        Self::with_store_factory(config, Arc::new(factory))
    }

    pub fn with_store_factory(config: FolioConfig, stores: Arc<dyn StoreFactory>) -> SdkResult<Self> {
        let hub = NotificationHub::new(config.notify)?;
        Ok(Self {
            stores,
            registry: EditingSessionRegistry::new(),
            hub,
            content_root: config.store.content_root,
        })
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    pub fn registry(&self) -> &EditingSessionRegistry {
        &self.registry
    }

    fn scope(&self, project: &ProjectContext, caller: &UserId) -> SdkResult<Scope> {
        let backend = backend_for(project.kind, &self.content_root);
        let subject = backend.credential_subject(project, caller);
        debug!(project = %project.id, %caller, %subject, kind = %project.kind, "opening store");
        let store = self.stores.open(&subject)?;
        Ok(Scope { store, backend })
    }

    // ---- Commits ----

    /// Commit `edits` on the caller's editing branch, or on the main line
    /// when the caller has none, and notify the project's viewers.
    pub async fn commit(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        edits: &[Edit],
        message: &str,
    ) -> SdkResult<CommitOutcome> {
        let branch = self
            .registry
            .get(&project.id, caller)
            .unwrap_or_else(|| MAIN_BRANCH.to_string());
        self.commit_to(project, caller, &branch, edits, message).await
    }

    /// Commit `edits` on an explicit branch and notify the project's viewers.
    pub async fn commit_to(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        branch: &str,
        edits: &[Edit],
        message: &str,
    ) -> SdkResult<CommitOutcome> {
        let scope = self.scope(project, caller)?;
        let outcome = CommitPipeline::new(scope.store.as_ref(), &project.coords)
            .run(branch, edits, message)
            .await?;
        self.hub.publish(&project.id, caller, None);
        Ok(outcome)
    }

    // ---- Editing branches ----

    /// Branch off the main line and make the new branch the caller's
    /// editing branch.
    pub async fn create_editing_branch(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        branch: &str,
    ) -> SdkResult<ObjectId> {
        let scope = self.scope(project, caller)?;
        let head = self
            .branches(&scope, project, caller)
            .start(branch, MAIN_BRANCH)
            .await?;
        Ok(head)
    }

    pub async fn delete_editing_branch(&self, project: &ProjectContext, caller: &UserId, branch: &str) -> SdkResult<()> {
        let scope = self.scope(project, caller)?;
        self.branches(&scope, project, caller).discard(branch).await?;
        Ok(())
    }

    /// The caller's editing branch on `project`, if they have one.
    pub fn editing_branch(&self, project: &ProjectId, caller: &UserId) -> Option<String> {
        self.registry.get(project, caller)
    }

    pub fn editing_sessions(&self, project: &ProjectId) -> Vec<EditingSession> {
        self.registry.sessions(project)
    }

    /// Open a pull request from the caller's editing branch into the main
    /// line. The caller is back on the main line afterwards.
    pub async fn publish_editing_branch(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        request: &PublishRequest,
    ) -> SdkResult<PullRequest> {
        let scope = self.scope(project, caller)?;
        let pull = self.branches(&scope, project, caller).publish(request).await?;
        Ok(pull)
    }

    fn branches<'a>(&'a self, scope: &'a Scope, project: &'a ProjectContext, caller: &'a UserId) -> EditingBranches<'a> {
        EditingBranches::new(scope.store.as_ref(), &self.registry, &project.coords, project.id, caller)
    }

    // ---- Folder tree ----

    pub async fn load_folder_tree(&self, project: &ProjectContext, caller: &UserId) -> SdkResult<FolderSnapshot> {
        let scope = self.scope(project, caller)?;
        Ok(tree_store(&scope, project).load().await?)
    }

    /// Replace the folder document, provided it still has content id
    /// `previous`. A concurrent change fails with a conflict.
    pub async fn save_folder_tree(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        tree: &[FolderNode],
        previous: &ObjectId,
    ) -> SdkResult<ObjectId> {
        let scope = self.scope(project, caller)?;
        let id = tree_store(&scope, project).save(tree, previous).await?;
        self.hub.publish(&project.id, caller, None);
        Ok(id)
    }

    /// Write an empty folder document for a new project.
    pub async fn initialize_folder_tree(&self, project: &ProjectContext, caller: &UserId) -> SdkResult<ObjectId> {
        let scope = self.scope(project, caller)?;
        let id = tree_store(&scope, project).initialize().await?;
        info!(project = %project.id, %caller, "project folder initialized");
        Ok(id)
    }

    pub async fn insert_node(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        parent: Option<&NodeId>,
        node: FolderNode,
    ) -> SdkResult<FolderSnapshot> {
        let scope = self.scope(project, caller)?;
        let edit = tree_store(&scope, project).insert_node(parent, node).await?;
        Ok(self.announce(project, caller, edit))
    }

    pub async fn rename_node(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        id: &NodeId,
        name: &str,
    ) -> SdkResult<FolderSnapshot> {
        let scope = self.scope(project, caller)?;
        let edit = tree_store(&scope, project).rename_node(id, name).await?;
        Ok(self.announce(project, caller, edit))
    }

    pub async fn delete_node(&self, project: &ProjectContext, caller: &UserId, id: &NodeId) -> SdkResult<FolderSnapshot> {
        let scope = self.scope(project, caller)?;
        let edit = tree_store(&scope, project).delete_node(id).await?;
        Ok(self.announce(project, caller, edit))
    }

    /// Notify viewers only when a node operation actually wrote the tree.
    fn announce(&self, project: &ProjectContext, caller: &UserId, edit: NodeEdit) -> FolderSnapshot {
        if edit.changed {
            self.hub.publish(&project.id, caller, None);
        }
        edit.snapshot
    }

    // ---- Files ----

    pub async fn read_file(&self, project: &ProjectContext, caller: &UserId, id: &NodeId) -> SdkResult<FileDocument> {
        let scope = self.scope(project, caller)?;
        Ok(tree_store(&scope, project).read_file(id).await?)
    }

    pub async fn write_file(
        &self,
        project: &ProjectContext,
        caller: &UserId,
        id: &NodeId,
        content: &str,
        previous: Option<&ObjectId>,
    ) -> SdkResult<ObjectId> {
        let scope = self.scope(project, caller)?;
        let new_id = tree_store(&scope, project).write_file(id, content, previous).await?;
        self.hub.publish(&project.id, caller, None);
        Ok(new_id)
    }

    // ---- Notifications ----

    /// Register for the next update of `project`. See
    /// [`NotificationHub::subscribe`].
    pub fn subscribe(&self, project: ProjectId) -> Subscription {
        self.hub.subscribe(project)
    }

    /// Long poll: the next update of `project`, or `None` on timeout.
    pub async fn wait_for_update(&self, project: ProjectId) -> Option<Update> {
        self.hub.wait_for_update(project).await
    }

    pub fn open_project_socket(&self, project: ProjectId) -> RoomMember {
        self.hub.join(project)
    }

    pub fn close_project_socket(&self, project: &ProjectId, connection: ConnectionId) -> bool {
        self.hub.leave(project, connection)
    }

    pub fn publish_update(&self, project: &ProjectId, actor: &UserId, origin: Option<ConnectionId>) -> Delivery {
        self.hub.publish(project, actor, origin)
    }
}

fn tree_store<'a>(scope: &'a Scope, project: &'a ProjectContext) -> FolderTreeStore<'a> {
    FolderTreeStore::new(scope.store.as_ref(), &project.coords, scope.backend.layout(project))
}

#[cfg(test)]
mod tests {
    use folio_notify::RoomEvent;
    use folio_store::{InMemoryObjectStore, StoreCall, StoreError, StoreOp};
    use folio_types::{AccountKind, RepoCoordinates};

    use super::*;
    use crate::stores::SharedStoreFactory;

    struct Fixture {
        store: Arc<InMemoryObjectStore>,
        folio: Folio,
        project: ProjectContext,
        alice: UserId,
    }

    impl Fixture {
        fn new(kind: AccountKind) -> Self {
            let store = Arc::new(InMemoryObjectStore::new());
            let project = ProjectContext {
                id: ProjectId::new(),
                coords: RepoCoordinates::new("acme", "docs"),
                kind,
                owner: UserId::new("owner").unwrap(),
            };
            store.seed_repo(&project.coords, &[("README.md", "hello")]);
            let shared: Arc<dyn ObjectStoreClient> = store.clone();
            let folio =
                Folio::with_store_factory(FolioConfig::default(), Arc::new(SharedStoreFactory::new(shared))).unwrap();
            Self {
                store,
                folio,
                project,
                alice: UserId::new("alice").unwrap(),
            }
        }

        fn main_file(&self, path: &str) -> Option<String> {
            self.store.file(&self.project.coords, MAIN_BRANCH, path)
        }
    }

    #[tokio::test]
    async fn commit_without_session_lands_on_main_and_notifies() {
        let f = Fixture::new(AccountKind::Github);
        let waiter = f.folio.subscribe(f.project.id);

        let outcome = f
            .folio
            .commit(&f.project, &f.alice, &[Edit::write("notes.md", "hi")], "add notes")
            .await
            .unwrap();

        assert_eq!(outcome.branch, MAIN_BRANCH);
        assert_eq!(f.main_file("notes.md").as_deref(), Some("hi"));
        let update = waiter.wait().await.unwrap();
        assert_eq!(update.updated_by, f.alice);
    }

    #[tokio::test]
    async fn commit_follows_editing_branch() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.create_editing_branch(&f.project, &f.alice, "edit/alice").await.unwrap();

        let outcome = f
            .folio
            .commit(&f.project, &f.alice, &[Edit::write("draft.md", "wip")], "draft")
            .await
            .unwrap();

        assert_eq!(outcome.branch, "edit/alice");
        assert_eq!(f.main_file("draft.md"), None);
        assert_eq!(
            f.store.file(&f.project.coords, "edit/alice", "draft.md").as_deref(),
            Some("wip")
        );

        // Another user still commits to main.
        let bob = UserId::new("bob").unwrap();
        let outcome = f
            .folio
            .commit(&f.project, &bob, &[Edit::write("b.md", "b")], "bob")
            .await
            .unwrap();
        assert_eq!(outcome.branch, MAIN_BRANCH);
    }

    #[tokio::test]
    async fn failed_commit_publishes_nothing() {
        let f = Fixture::new(AccountKind::Github);
        let mut member = f.folio.open_project_socket(f.project.id);
        f.store.fail_next(StoreOp::CreateCommit, StoreError::Remote {
            status: 500,
            message: "boom".into(),
        });

        let err = f
            .folio
            .commit(&f.project, &f.alice, &[Edit::write("x", "y")], "m")
            .await
            .unwrap_err();
        assert!(err.store_error().is_some());
        assert_eq!(member.try_recv(), None);
    }

    #[tokio::test]
    async fn publish_opens_pull_request_and_returns_to_main() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.create_editing_branch(&f.project, &f.alice, "edit/alice").await.unwrap();
        assert_eq!(f.folio.editing_branch(&f.project.id, &f.alice).as_deref(), Some("edit/alice"));

        let pull = f
            .folio
            .publish_editing_branch(&f.project, &f.alice, &PublishRequest::default())
            .await
            .unwrap();

        assert_eq!(pull.number, 1);
        assert_eq!(f.folio.editing_branch(&f.project.id, &f.alice), None);
        let prs = f.store.pull_requests(&f.project.coords);
        assert_eq!(prs[0].0.title, "Changes from alice");
    }

    #[tokio::test]
    async fn delete_editing_branch_clears_session() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.create_editing_branch(&f.project, &f.alice, "edit/alice").await.unwrap();
        assert_eq!(f.folio.editing_sessions(&f.project.id).len(), 1);
        f.folio.delete_editing_branch(&f.project, &f.alice, "edit/alice").await.unwrap();
        assert!(f.folio.editing_sessions(&f.project.id).is_empty());
        assert_eq!(f.store.head(&f.project.coords, "edit/alice"), None);
    }

    #[tokio::test]
    async fn folder_lifecycle_on_github_layout() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.initialize_folder_tree(&f.project, &f.alice).await.unwrap();

        let docs = NodeId::from_u128(1);
        let intro = NodeId::from_u128(2);
        f.folio
            .insert_node(&f.project, &f.alice, None, FolderNode::new(docs, "docs"))
            .await
            .unwrap();
        let snapshot = f
            .folio
            .insert_node(&f.project, &f.alice, Some(&docs), FolderNode::new(intro, "intro"))
            .await
            .unwrap();
        assert_eq!(snapshot.tree[0].children[0].id, intro);
        assert!(f
            .main_file("folio/files/00000000-0000-0000-0000-000000000002.json")
            .is_some());

        let renamed = f.folio.rename_node(&f.project, &f.alice, &intro, "Intro").await.unwrap();
        assert_eq!(renamed.tree[0].children[0].name, "Intro");

        let after = f.folio.delete_node(&f.project, &f.alice, &docs).await.unwrap();
        assert!(after.tree.is_empty());
        assert!(f.main_file("folio/files/00000000-0000-0000-0000-000000000001.json").is_none());
        assert_eq!(f.folio.load_folder_tree(&f.project, &f.alice).await.unwrap(), after);
    }

    #[tokio::test]
    async fn node_operations_that_change_nothing_stay_silent() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.initialize_folder_tree(&f.project, &f.alice).await.unwrap();
        let page = NodeId::from_u128(1);
        f.folio
            .insert_node(&f.project, &f.alice, None, FolderNode::new(page, "page"))
            .await
            .unwrap();
        let mut member = f.folio.open_project_socket(f.project.id);
        let unknown = NodeId::from_u128(99);

        f.folio.rename_node(&f.project, &f.alice, &unknown, "ghost").await.unwrap();
        f.folio.delete_node(&f.project, &f.alice, &unknown).await.unwrap();
        f.folio
            .insert_node(&f.project, &f.alice, Some(&unknown), FolderNode::new(NodeId::from_u128(2), "orphan"))
            .await
            .unwrap();
        f.folio
            .insert_node(&f.project, &f.alice, None, FolderNode::new(page, "again"))
            .await
            .unwrap();
        assert_eq!(member.try_recv(), None);

        f.folio.rename_node(&f.project, &f.alice, &page, "Page").await.unwrap();
        assert!(member.try_recv().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rename_of_unknown_node_leaves_long_poll_waiting() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.initialize_folder_tree(&f.project, &f.alice).await.unwrap();
        let waiter = f.folio.subscribe(f.project.id);

        f.folio
            .rename_node(&f.project, &f.alice, &NodeId::from_u128(7), "ghost")
            .await
            .unwrap();

        assert_eq!(waiter.wait().await, None);
    }

    #[tokio::test]
    async fn google_projects_live_under_project_directory() {
        let f = Fixture::new(AccountKind::Google);
        f.folio.initialize_folder_tree(&f.project, &f.alice).await.unwrap();
        let path = format!("folio/{}/folder/folder.json", f.project.id);
        assert_eq!(f.main_file(&path).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn stale_folder_save_is_conflict() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.initialize_folder_tree(&f.project, &f.alice).await.unwrap();
        let stale = f.folio.load_folder_tree(&f.project, &f.alice).await.unwrap();
        f.folio
            .insert_node(&f.project, &f.alice, None, FolderNode::new(NodeId::from_u128(9), "x"))
            .await
            .unwrap();

        let err = f
            .folio
            .save_folder_tree(&f.project, &f.alice, &[], &stale.content_id)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn file_round_trip_with_content_id() {
        let f = Fixture::new(AccountKind::Github);
        f.folio.initialize_folder_tree(&f.project, &f.alice).await.unwrap();
        let id = NodeId::from_u128(3);
        f.folio
            .insert_node(&f.project, &f.alice, None, FolderNode::new(id, "page"))
            .await
            .unwrap();

        let doc = f.folio.read_file(&f.project, &f.alice, &id).await.unwrap();
        assert_eq!(doc.content, "{}");
        f.folio
            .write_file(&f.project, &f.alice, &id, r#"{"text":"hi"}"#, Some(&doc.content_id))
            .await
            .unwrap();
        let err = f
            .folio
            .write_file(&f.project, &f.alice, &id, "late", Some(&doc.content_id))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn publish_update_skips_origin_socket() {
        let f = Fixture::new(AccountKind::Github);
        let mut a = f.folio.open_project_socket(f.project.id);
        let mut b = f.folio.open_project_socket(f.project.id);

        let delivery = f.folio.publish_update(&f.project.id, &f.alice, Some(a.id()));
        assert_eq!(delivery.members, 1);
        assert!(matches!(b.recv().await, Some(RoomEvent::Update(_))));
        assert_eq!(a.try_recv(), None);

        assert!(f.folio.close_project_socket(&f.project.id, a.id()));
        assert!(f.folio.close_project_socket(&f.project.id, b.id()));
        assert!(!f.folio.hub().has_room(&f.project.id));
    }

    #[tokio::test]
    async fn store_is_opened_for_backend_subject() {
        struct Recording {
            store: Arc<dyn ObjectStoreClient>,
            subjects: std::sync::Mutex<Vec<UserId>>,
        }
        impl StoreFactory for Recording {
            fn open(&self, subject: &UserId) -> SdkResult<Arc<dyn ObjectStoreClient>> {
                self.subjects.lock().unwrap().push(subject.clone());
                Ok(Arc::clone(&self.store))
            }
        }

        let f = Fixture::new(AccountKind::Google);
        let store: Arc<dyn ObjectStoreClient> = f.store.clone();
        let recording = Arc::new(Recording {
            store,
            subjects: Default::default(),
        });
        let folio = Folio::with_store_factory(FolioConfig::default(), recording.clone()).unwrap();
        folio
            .commit(&f.project, &f.alice, &[Edit::write("a", "b")], "m")
            .await
            .unwrap();
        assert_eq!(recording.subjects.lock().unwrap().as_slice(), &[f.project.owner.clone()]);
        assert!(matches!(f.store.calls().last(), Some(StoreCall::UpdateBranchHead { .. })));
    }
}
