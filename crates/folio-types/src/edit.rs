use serde::{Deserialize, Serialize};

/// Content value clients send to mark a path for deletion.
pub const DELETE_SENTINEL: &str = "null";

/// What happens to one path in a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "content", rename_all = "lowercase")]
pub enum Change {
    /// Add the path, or replace its content.
    Write(String),
    /// Remove the path from the tree.
    Delete,
}

/// One path-level edit supplied by a caller for a single commit.
///
/// Edits are transient: they exist for the duration of one pipeline run
/// and are never persisted on their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Repository-relative path, e.g. `docs/files/<id>.json`.
    pub path: String,
    /// Content the client saw before editing, if it sent one.
    pub previous: Option<String>,
    pub change: Change,
}

impl Edit {
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous: None,
            change: Change::Write(content.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous: None,
            change: Change::Delete,
        }
    }

    /// Build an edit from the client wire form, where the new content is a
    /// plain string and [`DELETE_SENTINEL`] means "remove this path".
    pub fn from_changed_content(
        path: impl Into<String>,
        previous: Option<String>,
        changed: &str,
    ) -> Self {
        let change = if changed == DELETE_SENTINEL {
            Change::Delete
        } else {
            Change::Write(changed.to_string())
        };
        Self {
            path: path.into(),
            previous,
            change,
        }
    }

    pub fn with_previous(mut self, previous: impl Into<String>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    pub fn is_delete(&self) -> bool {
        matches!(self.change, Change::Delete)
    }
}
