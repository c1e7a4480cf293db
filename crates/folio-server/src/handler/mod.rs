//! Request handlers. Each one resolves the project, calls [`folio_sdk::Folio`]
//! and shapes the result as JSON.

pub mod branch;
pub mod commit;
pub mod folder;
pub mod notify;

use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
