//! HTTP and WebSocket adapter for Folio.
//!
//! A thin axum layer over [`folio_sdk::Folio`]: every handler resolves the
//! project through a [`ProjectDirectory`], takes the caller from the
//! `X-User-Id` header and maps SDK errors to HTTP statuses. Authentication
//! and authorization happen in front of this server.

pub mod config;
pub mod directory;
pub mod error;
pub mod handler;
pub mod identity;
pub mod router;
pub mod server;

pub use config::{CredentialsConfig, ServerConfig};
pub use directory::{ProjectDirectory, StaticProjectDirectory};
pub use error::{ServerError, ServerResult};
pub use identity::{Caller, USER_HEADER};
pub use router::{build_router, AppState};
pub use server::FolioServer;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use folio_notify::NotifyConfig;
    use folio_sdk::{
        AccountKind, Folio, FolioConfig, ProjectContext, ProjectId, RepoCoordinates, SharedStoreFactory, UserId,
    };
    use folio_store::{InMemoryObjectStore, ObjectStoreClient};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use super::*;

    struct Harness {
        app: Router,
        folio: Arc<Folio>,
        store: Arc<InMemoryObjectStore>,
        project: ProjectContext,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryObjectStore::new());
        let project = ProjectContext {
            id: ProjectId::new(),
            coords: RepoCoordinates::new("acme", "docs"),
            kind: AccountKind::Github,
            owner: UserId::new("alice").unwrap(),
        };
        store.seed_repo(&project.coords, &[("README.md", "hello")]);
        let shared: Arc<dyn ObjectStoreClient> = store.clone();
        let config = FolioConfig {
            notify: NotifyConfig {
                long_poll_timeout_secs: 5,
                ..Default::default()
            },
            ..Default::default()
        };
        let folio = Arc::new(Folio::with_store_factory(config, Arc::new(SharedStoreFactory::new(shared))).unwrap());
        let projects = Arc::new(StaticProjectDirectory::new([project.clone()]));
        let app = build_router(AppState::new(Arc::clone(&folio), projects));
        Harness {
            app,
            folio,
            store,
            project,
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            req = req.header(USER_HEADER, user);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let h = harness();
        let (status, body) = send(&h.app, "GET", "/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn commit_requires_identity_and_known_project() {
        let h = harness();
        let body = json!({ "project": h.project.id, "message": "m", "changes": [] });
        let (status, _) = send(&h.app, "POST", "/v1/commit", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let body = json!({ "project": ProjectId::new(), "message": "m", "changes": [] });
        let (status, _) = send(&h.app, "POST", "/v1/commit", Some("alice"), Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn commit_writes_and_deletes_paths() {
        let h = harness();
        let body = json!({
            "project": h.project.id,
            "message": "edit docs",
            "changes": [
                { "path": "intro.md", "content": "welcome" },
                { "path": "README.md", "previous": "hello", "content": "null" }
            ]
        });
        let (status, resp) = send(&h.app, "POST", "/v1/commit", Some("alice"), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["branch"], "main");
        assert_eq!(h.store.file(&h.project.coords, "main", "intro.md").as_deref(), Some("welcome"));
        assert_eq!(h.store.file(&h.project.coords, "main", "README.md"), None);
    }

    #[tokio::test]
    async fn empty_commit_is_bad_request() {
        let h = harness();
        let body = json!({ "project": h.project.id, "message": "m", "changes": [] });
        let (status, resp) = send(&h.app, "POST", "/v1/commit", Some("alice"), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(resp["error"].is_string());
    }

    #[tokio::test]
    async fn editing_branch_lifecycle() {
        let h = harness();
        let p = h.project.id;
        let create = json!({ "project": p, "branch": "edit/alice" });
        let (status, resp) = send(&h.app, "POST", "/v1/branches", Some("alice"), Some(create)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp["branch"], "edit/alice");

        let (_, check) = send(&h.app, "GET", &format!("/v1/branches/check/{p}"), Some("alice"), None).await;
        assert_eq!(check["exists"], true);
        let (_, other) = send(&h.app, "GET", &format!("/v1/branches/check/{p}"), Some("bob"), None).await;
        assert_eq!(other["exists"], false);

        let (status, _) = send(&h.app, "DELETE", &format!("/v1/branches/{p}/edit%2Falice"), Some("alice"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(h.store.head(&h.project.coords, "edit/alice"), None);
        let (_, check) = send(&h.app, "GET", &format!("/v1/branches/check/{p}"), Some("alice"), None).await;
        assert_eq!(check["exists"], false);
    }

    #[tokio::test]
    async fn invalid_branch_name_is_bad_request() {
        let h = harness();
        let create = json!({ "project": h.project.id, "branch": "main" });
        let (status, _) = send(&h.app, "POST", "/v1/branches", Some("alice"), Some(create)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn publish_without_session_is_not_found() {
        let h = harness();
        let uri = format!("/v1/branches/{}/publish", h.project.id);
        let (status, _) = send(&h.app, "POST", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn publish_opens_pull_request() {
        let h = harness();
        let p = h.project.id;
        let create = json!({ "project": p, "branch": "edit/alice" });
        send(&h.app, "POST", "/v1/branches", Some("alice"), Some(create)).await;
        let (status, pull) = send(
            &h.app,
            "POST",
            &format!("/v1/branches/{p}/publish"),
            Some("alice"),
            Some(json!({ "title": "Rewrite intro" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(pull["number"], 1);
    }

    #[tokio::test]
    async fn folder_and_file_endpoints() {
        let h = harness();
        let p = h.project.id;
        let (status, _) = send(&h.app, "POST", &format!("/v1/folder/{p}/init"), Some("alice"), None).await;
        assert_eq!(status, StatusCode::CREATED);

        let node = "00000000-0000-0000-0000-00000000000a";
        let (status, tree) = send(
            &h.app,
            "POST",
            &format!("/v1/folder/{p}/nodes"),
            Some("alice"),
            Some(json!({ "id": node, "name": "Guide" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree["tree"][0]["name"], "Guide");

        let (_, renamed) = send(
            &h.app,
            "PATCH",
            &format!("/v1/folder/{p}/nodes/{node}"),
            Some("alice"),
            Some(json!({ "name": "Handbook" })),
        )
        .await;
        assert_eq!(renamed["tree"][0]["name"], "Handbook");

        let (status, file) = send(&h.app, "GET", &format!("/v1/files/{p}/{node}"), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(file["content"], "{}");
        let (status, _) = send(
            &h.app,
            "PUT",
            &format!("/v1/files/{p}/{node}"),
            Some("alice"),
            Some(json!({ "content": "{\"text\":1}", "previous": file["contentId"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, loaded) = send(&h.app, "GET", &format!("/v1/folder/{p}"), Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["tree"], renamed["tree"]);

        let (_, after) = send(&h.app, "DELETE", &format!("/v1/folder/{p}/nodes/{node}"), Some("alice"), None).await;
        assert_eq!(after["tree"], json!([]));
        let (status, _) = send(&h.app, "GET", &format!("/v1/files/{p}/{node}"), Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stale_folder_save_is_conflict() {
        let h = harness();
        let p = h.project.id;
        send(&h.app, "POST", &format!("/v1/folder/{p}/init"), Some("alice"), None).await;
        let (_, loaded) = send(&h.app, "GET", &format!("/v1/folder/{p}"), Some("alice"), None).await;
        send(
            &h.app,
            "POST",
            &format!("/v1/folder/{p}/nodes"),
            Some("bob"),
            Some(json!({ "name": "Bob's page" })),
        )
        .await;

        let (status, _) = send(
            &h.app,
            "PUT",
            &format!("/v1/folder/{p}"),
            Some("alice"),
            Some(json!({ "tree": [], "previous": loaded["contentId"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_times_out_with_no_content() {
        let h = harness();
        let (status, _) = send(&h.app, "GET", &format!("/v1/poll/{}", h.project.id), None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_returns_update() {
        let h = harness();
        let uri = format!("/v1/poll/{}", h.project.id);
        let app = h.app.clone();
        let poll = tokio::spawn(async move { send(&app, "GET", &uri, None, None).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.folio.hub().waiting(&h.project.id), 1);
        h.folio
            .publish_update(&h.project.id, &UserId::new("alice").unwrap(), None);

        let (status, body) = poll.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "updatedBy": "alice" }));
    }
}
