//! Commits and editing branches for Folio.
//!
//! [`CommitPipeline`] turns a list of path-level edits into one new commit
//! on a branch of the project's repository. [`EditingBranches`] creates,
//! discards and publishes the private branches users edit on, keeping the
//! editing-session registry in step with the remote.
//!
//! # Guarantees
//!
//! 1. The five commit stages run strictly in order; the first failure stops
//!    the run.
//! 2. The branch moves only in the last stage, and only if it still points
//!    at the head resolved in the first.
//! 3. Orphaned trees and commits from failed runs are left for the remote to
//!    collect.

pub mod branch;
pub mod error;
pub mod pipeline;
pub mod stage;

pub use branch::{EditingBranches, PublishRequest};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{build_entries, CommitOutcome, CommitPipeline};
pub use stage::{PipelineStage, StageRecord};
