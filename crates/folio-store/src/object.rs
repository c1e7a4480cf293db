use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use folio_types::{Change, Edit, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Git file mode of a tree entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Regular non-executable file (`100644`).
    #[default]
    #[serde(rename = "100644")]
    Regular,
    /// Executable file (`100755`).
    #[serde(rename = "100755")]
    Executable,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "100644",
            Self::Executable => "100755",
        }
    }
}

/// Kind of object a tree entry points at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Blob,
    Tree,
}

/// One record sent to the remote tree-creation call.
///
/// A present `content` adds or replaces the file at `path`. An absent
/// `content` removes the path from the base tree; the entry is still sent,
/// it is never dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: EntryMode,
    pub kind: EntryKind,
    pub content: Option<String>,
}

impl TreeEntry {
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: EntryMode::Regular,
            kind: EntryKind::Blob,
            content: Some(content.into()),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: EntryMode::Regular,
            kind: EntryKind::Blob,
            content: None,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.content.is_none()
    }
}

impl From<&Edit> for TreeEntry {
    fn from(edit: &Edit) -> Self {
        match &edit.change {
            Change::Write(content) => Self::write(edit.path.clone(), content.clone()),
            Change::Delete => Self::remove(edit.path.clone()),
        }
    }
}

/// A file read through the path-addressed blob API.
///
/// `content` is kept in the platform's transfer encoding (standard base64)
/// so that writing it back unmodified is byte-identical.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobContent {
    pub path: String,
    pub content: String,
    /// Current content id; pass it back as the optimistic-concurrency token.
    pub content_id: ObjectId,
}

impl BlobContent {
    /// Decode the base64 payload into raw bytes.
    pub fn decode(&self) -> StoreResult<Vec<u8>> {
        decode_base64(&self.content)
    }
}

/// Decode base64 as served by the platform, which wraps lines at 60 columns.
pub fn decode_base64(encoded: &str) -> StoreResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| StoreError::Malformed(format!("invalid base64 content: {e}")))
}

pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Request to open a pull request from an editing branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSpec {
    pub title: String,
    /// Branch holding the changes.
    pub head: String,
    /// Branch the changes should land on.
    pub base: String,
    pub body: Option<String>,
}

/// A pull request opened on the hosting platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_edit_becomes_content_entry() {
        let entry = TreeEntry::from(&Edit::write("a.json", "new"));
        assert_eq!(entry.path, "a.json");
        assert_eq!(entry.mode, EntryMode::Regular);
        assert_eq!(entry.kind, EntryKind::Blob);
        assert_eq!(entry.content.as_deref(), Some("new"));
    }

    #[test]
    fn delete_sentinel_becomes_blob_entry_without_content() {
        let edit = Edit::from_changed_content("gone.json", None, "null");
        let entry = TreeEntry::from(&edit);
        assert_eq!(entry.kind, EntryKind::Blob);
        assert!(entry.content.is_none());
        assert!(entry.is_removal());
    }

    #[test]
    fn decode_tolerates_wrapped_lines() {
        let encoded = encode_base64(b"hello world, this is a longer payload");
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        let blob = BlobContent {
            path: "p".into(),
            content: wrapped,
            content_id: ObjectId::digest(b"x"),
        };
        assert_eq!(blob.decode().unwrap(), b"hello world, this is a longer payload");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode_base64("@@@"), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn mode_serializes_as_octal_string() {
        assert_eq!(serde_json::to_string(&EntryMode::Regular).unwrap(), "\"100644\"");
        assert_eq!(EntryMode::Executable.as_str(), "100755");
    }
}
