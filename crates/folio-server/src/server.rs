use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use folio_sdk::Folio;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::ServerConfig;
use crate::directory::StaticProjectDirectory;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// Folio HTTP server.
pub struct FolioServer {
    config: ServerConfig,
}

impl FolioServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Wire the SDK to the configured credentials and projects.
    pub fn state(&self) -> ServerResult<AppState> {
        let credentials = self.config.credentials.provider()?;
        let folio = Folio::new(self.config.folio(), Arc::new(credentials))?;
        let projects = StaticProjectDirectory::new(self.config.projects.iter().cloned());
        Ok(AppState::new(Arc::new(folio), Arc::new(projects)))
    }

    /// Build the router (useful for testing).
    pub fn router(&self, state: AppState) -> ServerResult<Router> {
        let router = build_router(state);
        if self.config.cors_origins.is_empty() {
            return Ok(router);
        }
        let origins = self
            .config
            .cors_origins
            .iter()
            .map(|o| HeaderValue::from_str(o).map_err(|e| ServerError::Config(format!("cors origin {o:?}: {e}"))))
            .collect::<ServerResult<Vec<_>>>()?;
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any);
        Ok(router.layer(cors))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router(self.state()?)?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            projects = self.config.projects.len(),
            "folio server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = FolioServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[tokio::test]
    async fn state_and_router_build_without_tokens() {
        let server = FolioServer::new(ServerConfig {
            cors_origins: vec!["http://localhost:5173".into()],
            ..Default::default()
        });
        let state = server.state().unwrap();
        assert!(server.router(state).is_ok());
    }

    #[tokio::test]
    async fn bad_cors_origin_is_config_error() {
        let server = FolioServer::new(ServerConfig {
            cors_origins: vec!["bad\norigin".into()],
            ..Default::default()
        });
        let state = server.state().unwrap();
        assert!(matches!(server.router(state), Err(ServerError::Config(_))));
    }
}
