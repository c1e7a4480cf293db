use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use folio_sdk::Folio;
use tower_http::trace::TraceLayer;

use crate::directory::ProjectDirectory;
use crate::handler;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub folio: Arc<Folio>,
    pub projects: Arc<dyn ProjectDirectory>,
}

impl AppState {
    pub fn new(folio: Arc<Folio>, projects: Arc<dyn ProjectDirectory>) -> Self {
        Self { folio, projects }
    }
}

/// Build the axum router with all Folio endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/commit", post(handler::commit::commit_handler))
        .route("/v1/branches", post(handler::branch::create_handler))
        .route("/v1/branches/check/:project", get(handler::branch::check_handler))
        .route("/v1/branches/:project/publish", post(handler::branch::publish_handler))
        .route("/v1/branches/:project/:branch", delete(handler::branch::delete_handler))
        .route(
            "/v1/folder/:project",
            get(handler::folder::load_handler).put(handler::folder::save_handler),
        )
        .route("/v1/folder/:project/init", post(handler::folder::init_handler))
        .route("/v1/folder/:project/nodes", post(handler::folder::insert_handler))
        .route(
            "/v1/folder/:project/nodes/:id",
            patch(handler::folder::rename_handler).delete(handler::folder::delete_handler),
        )
        .route(
            "/v1/files/:project/:id",
            get(handler::folder::read_file_handler).put(handler::folder::write_file_handler),
        )
        .route("/v1/poll/:project", get(handler::notify::poll_handler))
        .route("/v1/ws/:project", get(handler::notify::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

