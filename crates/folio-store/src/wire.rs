//! Request and response bodies of the hosting platform's git data API.
//!
//! Only the fields Folio reads are declared; everything else in a response
//! is ignored during decoding.

use serde::{Deserialize, Serialize};

use crate::object::{EntryKind, EntryMode, TreeEntry};

#[derive(Debug, Deserialize)]
pub(crate) struct RefResponse {
    pub object: ShaOnly,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitResponse {
    pub tree: ShaOnly,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShaOnly {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTreeRequest<'a> {
    pub base_tree: &'a str,
    pub tree: Vec<WireTreeEntry<'a>>,
}

/// A tree entry as the platform expects it: additions carry `content`,
/// removals carry an explicit `"sha": null` and no `content` field.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum WireTreeEntry<'a> {
    Write {
        path: &'a str,
        mode: EntryMode,
        #[serde(rename = "type")]
        kind: EntryKind,
        content: &'a str,
    },
    Remove {
        path: &'a str,
        mode: EntryMode,
        #[serde(rename = "type")]
        kind: EntryKind,
        sha: Option<&'a str>,
    },
}

impl<'a> From<&'a TreeEntry> for WireTreeEntry<'a> {
    fn from(entry: &'a TreeEntry) -> Self {
        match &entry.content {
            Some(content) => Self::Write {
                path: &entry.path,
                mode: entry.mode,
                kind: entry.kind,
                content,
            },
            None => Self::Remove {
                path: &entry.path,
                mode: entry.mode,
                kind: entry.kind,
                sha: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCommitRequest<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRefRequest<'a> {
    pub sha: &'a str,
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRefRequest<'a> {
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePullRequest<'a> {
    pub title: &'a str,
    pub head: &'a str,
    pub base: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullResponse {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentResponse {
    pub sha: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutContentRequest<'a> {
    pub message: &'a str,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutContentResponse {
    pub content: ShaOnly,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteContentRequest<'a> {
    pub message: &'a str,
    pub sha: &'a str,
}

/// Error body returned on non-success responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: String,
}
