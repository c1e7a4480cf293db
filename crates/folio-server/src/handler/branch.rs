use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_sdk::{ObjectId, ProjectId, PublishRequest, PullRequest};
use serde::{Deserialize, Serialize};

use crate::error::ServerResult;
use crate::identity::Caller;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub project: ProjectId,
    pub branch: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBranchResponse {
    pub branch: String,
    pub head: ObjectId,
}

pub async fn create_handler(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<CreateBranchRequest>,
) -> ServerResult<(StatusCode, Json<CreateBranchResponse>)> {
    let project = state.projects.project(&req.project).await?;
    let head = state.folio.create_editing_branch(&project, &caller, &req.branch).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateBranchResponse {
            branch: req.branch,
            head,
        }),
    ))
}

/// Branch names containing `/` arrive percent-encoded in one segment.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((project, branch)): Path<(ProjectId, String)>,
    Caller(caller): Caller,
) -> ServerResult<StatusCode> {
    let project = state.projects.project(&project).await?;
    state.folio.delete_editing_branch(&project, &caller, &branch).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct EditingBranchResponse {
    pub exists: bool,
    pub branch: Option<String>,
}

pub async fn check_handler(
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
    Caller(caller): Caller,
) -> ServerResult<Json<EditingBranchResponse>> {
    let project = state.projects.project(&project).await?;
    let branch = state.folio.editing_branch(&project.id, &caller);
    Ok(Json(EditingBranchResponse {
        exists: branch.is_some(),
        branch,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

pub async fn publish_handler(
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
    Caller(caller): Caller,
    body: Option<Json<PublishBody>>,
) -> ServerResult<(StatusCode, Json<PullRequest>)> {
    let project = state.projects.project(&project).await?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = PublishRequest {
        title: body.title,
        body: body.body,
    };
    let pull = state.folio.publish_editing_branch(&project, &caller, &request).await?;
    Ok((StatusCode::CREATED, Json(pull)))
}
