use axum::extract::State;
use axum::Json;
use folio_sdk::{Edit, ObjectId, ProjectId};
use serde::{Deserialize, Serialize};

use crate::error::ServerResult;
use crate::identity::Caller;
use crate::router::AppState;

/// One changed path in client wire form. `content` equal to `"null"`
/// deletes the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeBody {
    pub path: String,
    #[serde(default)]
    pub previous: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub project: ProjectId,
    pub message: String,
    pub changes: Vec<ChangeBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub branch: String,
    pub commit: ObjectId,
    pub parent: ObjectId,
    pub tree: ObjectId,
}

/// Commit a batch of changes on the caller's editing branch, or on the main
/// line when they have none.
pub async fn commit_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<CommitRequest>,
) -> ServerResult<Json<CommitResponse>> {
    let project = state.projects.project(&req.project).await?;
    let edits: Vec<Edit> = req
        .changes
        .into_iter()
        .map(|c| Edit::from_changed_content(c.path, c.previous, &c.content))
        .collect();
    let outcome = state.folio.commit(&project, &caller, &edits, &req.message).await?;
    Ok(Json(CommitResponse {
        branch: outcome.branch,
        commit: outcome.commit,
        parent: outcome.previous_head,
        tree: outcome.tree,
    }))
}
