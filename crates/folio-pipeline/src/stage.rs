use std::fmt;
use std::time::Duration;

/// The five steps of a commit, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Resolve the target branch to its tip commit.
    ResolveHead,
    /// Read the root tree of that commit.
    ResolveBaseTree,
    /// Create a tree from the base tree plus the edits.
    BuildTree,
    /// Create a commit whose single parent is the resolved head.
    CreateCommit,
    /// Move the branch to the new commit, guarded by the resolved head.
    AdvanceRef,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ALL: [PipelineStage; 5] = [
        Self::ResolveHead,
        Self::ResolveBaseTree,
        Self::BuildTree,
        Self::CreateCommit,
        Self::AdvanceRef,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ResolveHead => "resolve-head",
            Self::ResolveBaseTree => "resolve-base-tree",
            Self::BuildTree => "build-tree",
            Self::CreateCommit => "create-commit",
            Self::AdvanceRef => "advance-ref",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing of one completed stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: PipelineStage,
    pub elapsed: Duration,
}
