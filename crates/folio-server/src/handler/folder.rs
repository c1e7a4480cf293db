use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_sdk::{FileDocument, FolderNode, FolderSnapshot, NodeId, ObjectId, ProjectId};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};
use crate::identity::Caller;
use crate::router::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderResponse {
    pub tree: Vec<FolderNode>,
    pub content_id: ObjectId,
}

impl From<FolderSnapshot> for FolderResponse {
    fn from(s: FolderSnapshot) -> Self {
        Self {
            tree: s.tree,
            content_id: s.content_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdResponse {
    pub content_id: ObjectId,
}

pub async fn load_handler(
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
    Caller(caller): Caller,
) -> ServerResult<Json<FolderResponse>> {
    let project = state.projects.project(&project).await?;
    let snapshot = state.folio.load_folder_tree(&project, &caller).await?;
    Ok(Json(snapshot.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFolderRequest {
    pub tree: Vec<FolderNode>,
    pub previous: ObjectId,
}

pub async fn save_handler(
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
    Caller(caller): Caller,
    Json(req): Json<SaveFolderRequest>,
) -> ServerResult<Json<ContentIdResponse>> {
    let project = state.projects.project(&project).await?;
    let content_id = state
        .folio
        .save_folder_tree(&project, &caller, &req.tree, &req.previous)
        .await?;
    Ok(Json(ContentIdResponse { content_id }))
}

pub async fn init_handler(
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
    Caller(caller): Caller,
) -> ServerResult<(StatusCode, Json<ContentIdResponse>)> {
    let project = state.projects.project(&project).await?;
    let content_id = state.folio.initialize_folder_tree(&project, &caller).await?;
    Ok((StatusCode::CREATED, Json(ContentIdResponse { content_id })))
}

#[derive(Debug, Deserialize)]
pub struct InsertNodeRequest {
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Clients normally assign ids; one is generated when absent.
    #[serde(default)]
    pub id: Option<NodeId>,
    pub name: String,
}

pub async fn insert_handler(
    State(state): State<AppState>,
    Path(project): Path<ProjectId>,
    Caller(caller): Caller,
    Json(req): Json<InsertNodeRequest>,
) -> ServerResult<Json<FolderResponse>> {
    let project = state.projects.project(&project).await?;
    let node = FolderNode::new(req.id.unwrap_or_default(), req.name);
    let snapshot = state
        .folio
        .insert_node(&project, &caller, req.parent.as_ref(), node)
        .await?;
    Ok(Json(snapshot.into()))
}

#[derive(Debug, Deserialize)]
pub struct RenameNodeRequest {
    pub name: String,
}

pub async fn rename_handler(
    State(state): State<AppState>,
    Path((project, id)): Path<(ProjectId, NodeId)>,
    Caller(caller): Caller,
    Json(req): Json<RenameNodeRequest>,
) -> ServerResult<Json<FolderResponse>> {
    let project = state.projects.project(&project).await?;
    let snapshot = state.folio.rename_node(&project, &caller, &id, &req.name).await?;
    Ok(Json(snapshot.into()))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Path((project, id)): Path<(ProjectId, NodeId)>,
    Caller(caller): Caller,
) -> ServerResult<Json<FolderResponse>> {
    let project = state.projects.project(&project).await?;
    let snapshot = state.folio.delete_node(&project, &caller, &id).await?;
    Ok(Json(snapshot.into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: NodeId,
    pub content: String,
    pub content_id: ObjectId,
}

impl From<FileDocument> for FileResponse {
    fn from(d: FileDocument) -> Self {
        Self {
            id: d.node,
            content: d.content,
            content_id: d.content_id,
        }
    }
}

pub async fn read_file_handler(
    State(state): State<AppState>,
    Path((project, id)): Path<(ProjectId, NodeId)>,
    Caller(caller): Caller,
) -> ServerResult<Json<FileResponse>> {
    let project = state.projects.project(&project).await?;
    let doc = state.folio.read_file(&project, &caller, &id).await?;
    Ok(Json(doc.into()))
}

#[derive(Debug, Deserialize)]
pub struct WriteFileRequest {
    pub content: String,
    #[serde(default)]
    pub previous: Option<ObjectId>,
}

pub async fn write_file_handler(
    State(state): State<AppState>,
    Path((project, id)): Path<(ProjectId, NodeId)>,
    Caller(caller): Caller,
    Json(req): Json<WriteFileRequest>,
) -> ServerResult<Json<ContentIdResponse>> {
    if req.content.is_empty() {
        return Err(ServerError::BadRequest("file content must not be empty".into()));
    }
    let project = state.projects.project(&project).await?;
    let content_id = state
        .folio
        .write_file(&project, &caller, &id, &req.content, req.previous.as_ref())
        .await?;
    Ok(Json(ContentIdResponse { content_id }))
}
