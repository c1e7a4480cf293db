//! Error types for commits and branch lifecycle operations.

use folio_refs::RefError;
use folio_store::StoreError;
use folio_types::{ProjectId, UserId};
use thiserror::Error;

use crate::stage::PipelineStage;

/// Errors from the commit pipeline and the editing-branch lifecycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A pipeline stage failed. Stages before it may have created objects
    /// on the remote, but the branch was not moved.
    #[error("commit failed at {stage}: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: StoreError,
    },

    /// The edit list was empty.
    #[error("nothing to commit")]
    NoEdits,

    /// A branch name was rejected before any remote call.
    #[error(transparent)]
    Ref(#[from] RefError),

    /// A branch lifecycle call failed on the remote.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Publishing was requested but the user has no editing branch.
    #[error("no editing branch for {user} on project {project}")]
    NoEditingSession { project: ProjectId, user: UserId },
}

impl PipelineError {
    /// The remote error underneath, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Stage { source, .. } => Some(source),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }

    /// The stage that failed, for `Stage` errors.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_conflict)
    }
}

/// Convenience type alias for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
