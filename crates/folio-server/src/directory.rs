//! Looking up a project's repository and account type.

use std::collections::HashMap;

use async_trait::async_trait;
use folio_sdk::{ProjectContext, ProjectId};

use crate::error::{ServerError, ServerResult};

/// Source of project metadata, usually the application's database.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn project(&self, id: &ProjectId) -> ServerResult<ProjectContext>;
}

/// Projects listed in the server configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticProjectDirectory {
    projects: HashMap<ProjectId, ProjectContext>,
}

impl StaticProjectDirectory {
    pub fn new(projects: impl IntoIterator<Item = ProjectContext>) -> Self {
        Self {
            projects: projects.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[async_trait]
impl ProjectDirectory for StaticProjectDirectory {
    async fn project(&self, id: &ProjectId) -> ServerResult<ProjectContext> {
        self.projects.get(id).cloned().ok_or(ServerError::ProjectNotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use folio_sdk::{AccountKind, RepoCoordinates, UserId};

    use super::*;

    #[tokio::test]
    async fn lookup_by_id() {
        let known = ProjectContext {
            id: ProjectId::new(),
            coords: RepoCoordinates::new("acme", "docs"),
            kind: AccountKind::Github,
            owner: UserId::new("alice").unwrap(),
        };
        let dir = StaticProjectDirectory::new([known.clone()]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.project(&known.id).await.unwrap(), known);
        assert!(matches!(
            dir.project(&ProjectId::new()).await,
            Err(ServerError::ProjectNotFound(_))
        ));
    }
}
