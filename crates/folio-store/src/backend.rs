//! Account-type specific storage behavior.
//!
//! Projects backed by a user's own hosting account and projects created
//! through a Google sign-in differ in two ways only: whose credential is
//! used for remote calls, and where in the repository Folio's documents
//! live. Both are captured by [`StorageBackend`], selected by
//! [`AccountKind`] through [`backend_for`].

use folio_types::{AccountKind, NodeId, ProjectId, RepoCoordinates, UserId};
use serde::{Deserialize, Serialize};

/// Everything Folio needs to know about a project for one request.
///
/// Produced by the application's project directory; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub id: ProjectId,
    pub coords: RepoCoordinates,
    pub kind: AccountKind,
    /// User who created the project and owns its repository credential.
    pub owner: UserId,
}

/// Repository paths of Folio's documents under one content root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentLayout {
    root: String,
}

impl ContentLayout {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into().trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Path of the JSON document describing the folder hierarchy.
    pub fn folder_document(&self) -> String {
        format!("{}/folder/folder.json", self.root)
    }

    /// Path of the file blob owned by a leaf node.
    pub fn file(&self, node: &NodeId) -> String {
        format!("{}/files/{node}.json", self.root)
    }
}

/// Storage behavior that varies by account type.
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> AccountKind;

    /// Whose credential authenticates remote calls made by `caller`.
    fn credential_subject(&self, project: &ProjectContext, caller: &UserId) -> UserId;

    /// Repository directory holding this project's documents.
    fn content_root_path(&self, project: &ProjectContext) -> String;

    fn layout(&self, project: &ProjectContext) -> ContentLayout {
        ContentLayout::new(self.content_root_path(project))
    }
}

/// Repository owned by the user or their organization.
#[derive(Clone, Debug)]
pub struct GithubBackend {
    root: String,
}

impl GithubBackend {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageBackend for GithubBackend {
    fn kind(&self) -> AccountKind {
        AccountKind::Github
    }

    fn credential_subject(&self, _project: &ProjectContext, caller: &UserId) -> UserId {
        caller.clone()
    }

    fn content_root_path(&self, _project: &ProjectContext) -> String {
        self.root.clone()
    }
}

/// Repository hosted on behalf of users without their own account.
///
/// One repository may hold several projects, so each project gets its own
/// directory, and every member acts through the owner's credential.
#[derive(Clone, Debug)]
pub struct GoogleBackend {
    root: String,
}

impl GoogleBackend {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageBackend for GoogleBackend {
    fn kind(&self) -> AccountKind {
        AccountKind::Google
    }

    fn credential_subject(&self, project: &ProjectContext, _caller: &UserId) -> UserId {
        project.owner.clone()
    }

    fn content_root_path(&self, project: &ProjectContext) -> String {
        format!("{}/{}", self.root, project.id)
    }
}

/// Select the backend for an account kind.
pub fn backend_for(kind: AccountKind, content_root: &str) -> Box<dyn StorageBackend> {
    match kind {
        AccountKind::Github => Box::new(GithubBackend::new(content_root)),
        AccountKind::Google => Box::new(GoogleBackend::new(content_root)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(kind: AccountKind) -> ProjectContext {
        ProjectContext {
            id: "00000000-0000-0000-0000-000000000007".parse().unwrap(),
            coords: RepoCoordinates::new("acme", "docs"),
            kind,
            owner: UserId::new("owner").unwrap(),
        }
    }

    #[test]
    fn github_uses_caller_credential() {
        let p = project(AccountKind::Github);
        let b = backend_for(p.kind, "folio");
        let caller = UserId::new("alice").unwrap();
        assert_eq!(b.credential_subject(&p, &caller), caller);
        assert_eq!(b.content_root_path(&p), "folio");
    }

    #[test]
    fn google_uses_owner_credential_and_project_dir() {
        let p = project(AccountKind::Google);
        let b = backend_for(p.kind, "folio");
        let caller = UserId::new("alice").unwrap();
        assert_eq!(b.credential_subject(&p, &caller).as_str(), "owner");
        assert_eq!(
            b.content_root_path(&p),
            "folio/00000000-0000-0000-0000-000000000007"
        );
        assert_eq!(b.kind(), AccountKind::Google);
    }

    #[test]
    fn layout_paths() {
        let layout = ContentLayout::new("/folio/");
        assert_eq!(layout.folder_document(), "folio/folder/folder.json");
        let node = NodeId::from_u128(1);
        assert_eq!(
            layout.file(&node),
            "folio/files/00000000-0000-0000-0000-000000000001.json"
        );
    }
}
