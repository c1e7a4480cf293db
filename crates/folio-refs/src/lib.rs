//! Branch naming and editing sessions for Folio.
//!
//! A user who "checks out" a project for editing works on a private branch
//! of the project's repository. This crate validates the names of those
//! branches and keeps the in-process map from (project, user) to branch.
//!
//! # Modules
//!
//! - [`names`] -- git ref naming rules, [`MAIN_BRANCH`]
//! - [`session`] -- [`EditingSessionRegistry`]

pub mod error;
pub mod names;
pub mod session;

pub use error::{RefError, RefResult};
pub use names::{validate_branch_name, validate_editing_branch_name, MAIN_BRANCH};
pub use session::{EditingSession, EditingSessionRegistry};
