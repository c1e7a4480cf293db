use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_pipeline::PipelineError;
use folio_sdk::{SdkError, StoreError};
use folio_tree::TreeError;
use folio_types::ProjectId;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("missing or invalid X-User-Id header")]
    MissingIdentity,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingIdentity => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Sdk(err) => sdk_status(err),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn sdk_status(err: &SdkError) -> StatusCode {
    if let Some(store) = err.store_error() {
        return store_status(store);
    }
    match err {
        SdkError::Pipeline(PipelineError::NoEdits) | SdkError::Ref(_) | SdkError::Pipeline(PipelineError::Ref(_)) => {
            StatusCode::BAD_REQUEST
        }
        SdkError::Pipeline(PipelineError::NoEditingSession { .. }) => StatusCode::NOT_FOUND,
        SdkError::Tree(TreeError::InvalidName(_)) => StatusCode::BAD_REQUEST,
        SdkError::Tree(TreeError::Codec(_)) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Unauthorized(_) | StoreError::Credential(_) => StatusCode::UNAUTHORIZED,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        StoreError::Remote { .. } | StoreError::Malformed(_) | StoreError::Transport(_) => StatusCode::BAD_GATEWAY,
        StoreError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
