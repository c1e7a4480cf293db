//! Process-local record of who is editing on which branch.
//!
//! An entry is written after the editing branch has been created on the
//! hosting platform and removed when the branch is discarded or published.
//! The registry is advisory: it routes a user's commits to their branch
//! and answers "is this user editing?", but it does not lock anything and
//! does not survive a restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use folio_types::{ProjectId, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RefResult;
use crate::names::validate_editing_branch_name;

/// One registered editing session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditingSession {
    pub project: ProjectId,
    pub user: UserId,
    pub branch: String,
}

/// Map of (project, user) to editing branch name.
///
/// Writes for the same key are last-writer-wins; different keys never
/// interact beyond sharing the lock.
#[derive(Debug, Default)]
pub struct EditingSessionRegistry {
    sessions: Mutex<HashMap<(ProjectId, UserId), String>>,
}

impl EditingSessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(ProjectId, UserId), String>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `branch` as the user's editing branch, returning the branch it
    /// replaced.
    pub fn set(&self, project: ProjectId, user: UserId, branch: impl Into<String>) -> RefResult<Option<String>> {
        let branch = branch.into();
        validate_editing_branch_name(&branch)?;
        debug!(%project, %user, %branch, "editing session registered");
        Ok(self.lock().insert((project, user), branch))
    }

    pub fn get(&self, project: &ProjectId, user: &UserId) -> Option<String> {
        self.lock().get(&(*project, user.clone())).cloned()
    }

    /// Forget the user's editing branch, returning it if one was recorded.
    pub fn clear(&self, project: &ProjectId, user: &UserId) -> Option<String> {
        let removed = self.lock().remove(&(*project, user.clone()));
        if let Some(branch) = &removed {
            debug!(%project, %user, %branch, "editing session cleared");
        }
        removed
    }

    /// Every session open on `project`, sorted by user.
    pub fn sessions(&self, project: &ProjectId) -> Vec<EditingSession> {
        let mut sessions: Vec<EditingSession> = self
            .lock()
            .iter()
            .filter(|((p, _), _)| p == project)
            .map(|((p, u), b)| EditingSession {
                project: *p,
                user: u.clone(),
                branch: b.clone(),
            })
            .collect();
        sessions.sort_by(|a, b| a.user.as_str().cmp(b.user.as_str()));
        sessions
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
