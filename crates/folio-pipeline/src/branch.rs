//! Editing-branch lifecycle: start, discard, publish.
//!
//! Each transition makes its remote call first and touches the registry
//! only after the call succeeded, so the registry never names a branch the
//! remote refused to create.

use folio_refs::{validate_editing_branch_name, EditingSessionRegistry, MAIN_BRANCH};
use folio_store::{ObjectStoreClient, PullRequest, PullRequestSpec};
use folio_types::{ObjectId, ProjectId, RepoCoordinates, UserId};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

/// Title and description of the pull request opened on publish.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishRequest {
    pub title: String,
    pub body: Option<String>,
}

/// Branch operations on behalf of one user of one project.
pub struct EditingBranches<'a> {
    store: &'a dyn ObjectStoreClient,
    registry: &'a EditingSessionRegistry,
    coords: &'a RepoCoordinates,
    project: ProjectId,
    user: &'a UserId,
}

impl<'a> EditingBranches<'a> {
    pub fn new(
        store: &'a dyn ObjectStoreClient,
        registry: &'a EditingSessionRegistry,
        coords: &'a RepoCoordinates,
        project: ProjectId,
        user: &'a UserId,
    ) -> Self {
        Self {
            store,
            registry,
            coords,
            project,
            user,
        }
    }

    /// The user's current editing branch, if any.
    pub fn current(&self) -> Option<String> {
        self.registry.get(&self.project, self.user)
    }

    /// Branch off `from` and register the new branch as the user's editing
    /// branch. Returns the commit both branches now point at.
    pub async fn start(&self, branch: &str, from: &str) -> PipelineResult<ObjectId> {
        validate_editing_branch_name(branch)?;
        let head = self.store.resolve_branch_head(self.coords, from).await?;
        self.store.create_branch(self.coords, branch, &head).await?;
        self.registry.set(self.project, self.user.clone(), branch)?;
        info!(
            repo = %self.coords,
            user = %self.user,
            branch,
            from,
            at = head.short_hex(),
            "editing branch created"
        );
        Ok(head)
    }

    /// Delete `branch` from the remote and forget it if it was the user's
    /// editing branch.
    ///
    /// The session is cleared only when `branch` is the registered one.
    /// Deleting some other editing branch leaves the user's current session
    /// in place instead of resetting them to main.
    pub async fn discard(&self, branch: &str) -> PipelineResult<()> {
        validate_editing_branch_name(branch)?;
        self.store.delete_branch(self.coords, branch).await?;
        if self.current().as_deref() == Some(branch) {
            self.registry.clear(&self.project, self.user);
        }
        info!(repo = %self.coords, user = %self.user, branch, "editing branch deleted");
        Ok(())
    }

    /// Open a pull request from the user's editing branch into the main
    /// line and release the editing session.
    ///
    /// The branch itself stays on the remote until the pull request is
    /// merged or closed there.
    pub async fn publish(&self, request: &PublishRequest) -> PipelineResult<PullRequest> {
        let branch = self.current().ok_or_else(|| PipelineError::NoEditingSession {
            project: self.project,
            user: self.user.clone(),
        })?;
        let spec = PullRequestSpec {
            title: if request.title.trim().is_empty() {
                format!("Changes from {}", self.user)
            } else {
                request.title.clone()
            },
            head: branch.clone(),
            base: MAIN_BRANCH.to_string(),
            body: request.body.clone(),
        };
        let pull = self.store.open_pull_request(self.coords, &spec).await?;
        self.registry.clear(&self.project, self.user);
        info!(
            repo = %self.coords,
            user = %self.user,
            branch = %branch,
            number = pull.number,
            "editing branch published"
        );
        Ok(pull)
    }
}
