//! [`ObjectStoreClient`] over the GitHub REST API.

use std::sync::Arc;

use async_trait::async_trait;
use folio_types::{ObjectId, RepoCoordinates, UserId};
use reqwest::header::ACCEPT;
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::credentials::{AccessToken, CredentialProvider};
use crate::error::{StoreError, StoreResult};
use crate::object::{BlobContent, PullRequest, PullRequestSpec, TreeEntry};
use crate::traits::ObjectStoreClient;
use crate::wire::{
    CommitResponse, ContentResponse, CreateCommitRequest, CreatePullRequest, CreateRefRequest,
    CreateTreeRequest, DeleteContentRequest, ErrorResponse, PullResponse, PutContentRequest,
    PutContentResponse, RefResponse, UpdateRefRequest, WireTreeEntry,
};

const MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Object store client for repositories hosted on GitHub.
///
/// One instance serves one request on behalf of one credential subject. The
/// access token is resolved lazily on the first call and cached; if the
/// platform answers `401` and the token is refreshable, the provider is asked
/// once for a fresh token and the same request is replayed. A second `401`
/// is returned as [`StoreError::Unauthorized`].
pub struct GithubObjectStore {
    http: reqwest::Client,
    config: StoreConfig,
    credentials: Arc<dyn CredentialProvider>,
    subject: UserId,
    token: Mutex<Option<AccessToken>>,
}

impl GithubObjectStore {
    /// Build a client with its own connection pool.
    pub fn new(
        config: StoreConfig,
        credentials: Arc<dyn CredentialProvider>,
        subject: UserId,
    ) -> StoreResult<Self> {
        let http = build_http_client(&config)?;
        Ok(Self::with_client(http, config, credentials, subject))
    }

    /// Build a client sharing an existing connection pool.
    pub fn with_client(
        http: reqwest::Client,
        config: StoreConfig,
        credentials: Arc<dyn CredentialProvider>,
        subject: UserId,
    ) -> Self {
        Self {
            http,
            config,
            credentials,
            subject,
            token: Mutex::new(None),
        }
    }

    pub fn subject(&self) -> &UserId {
        &self.subject
    }

    fn repo_url(&self, coords: &RepoCoordinates, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_base(),
            coords.owner,
            coords.repo,
            suffix.trim_start_matches('/')
        )
    }

    async fn current_token(&self) -> StoreResult<AccessToken> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = self.credentials.resolve(&self.subject).await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn dispatch<B>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
        token: &AccessToken,
    ) -> StoreResult<Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token.secret())
            .header(ACCEPT, MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;
        debug!(%method, url, status = %response.status(), "remote call");
        Ok(response)
    }

    async fn send<B>(&self, method: Method, url: &str, body: Option<&B>) -> StoreResult<Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let token = self.current_token().await?;
        let response = self.dispatch(&method, url, body, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED || !token.refreshable {
            return Ok(response);
        }

        warn!(subject = %self.subject, url, "access token rejected, refreshing once");
        let fresh = self.credentials.refresh(&self.subject).await?;
        *self.token.lock().await = Some(fresh.clone());
        self.dispatch(&method, url, body, &fresh).await
    }

    async fn get(&self, url: &str) -> StoreResult<Response> {
        self.send::<()>(Method::GET, url, None).await
    }
}

impl std::fmt::Debug for GithubObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubObjectStore")
            .field("api_base", &self.config.api_base())
            .field("subject", &self.subject)
            .finish()
    }
}

/// Build the shared HTTP client with the configured timeout and user agent.
pub fn build_http_client(config: &StoreConfig) -> StoreResult<reqwest::Client> {
    config.validate()?;
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| StoreError::Transport(format!("failed to build http client: {e}")))
}

fn transport_error(url: &str, err: &reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout(url.to_string())
    } else {
        StoreError::Transport(format!("{url}: {err}"))
    }
}

/// Map a non-success status to the error taxonomy.
fn classify(status: StatusCode, what: &str, message: &str) -> StoreError {
    let detail = if message.is_empty() {
        what.to_string()
    } else {
        format!("{what}: {message}")
    };
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(detail),
        StatusCode::UNAUTHORIZED => StoreError::Unauthorized(detail),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StoreError::Conflict(detail),
        _ => StoreError::Remote {
            status: status.as_u16(),
            message: detail,
        },
    }
}

async fn error_message(response: Response) -> String {
    response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_default()
}

async fn expect(response: Response, ok: &[StatusCode], what: &str) -> StoreResult<Response> {
    let status = response.status();
    if ok.contains(&status) {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(classify(status, what, &message))
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> StoreResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Malformed(format!("{what}: {e}")))
}

fn object_id(sha: &str, what: &str) -> StoreResult<ObjectId> {
    ObjectId::parse(sha).map_err(|e| StoreError::Malformed(format!("{what}: {e}")))
}

#[async_trait]
impl ObjectStoreClient for GithubObjectStore {
    async fn resolve_branch_head(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
    ) -> StoreResult<ObjectId> {
        let what = format!("branch {branch} of {coords}");
        let url = self.repo_url(coords, &format!("git/ref/heads/{branch}"));
        let response = expect(self.get(&url).await?, &[StatusCode::OK], &what).await?;
        let body: RefResponse = decode(response, &what).await?;
        object_id(&body.object.sha, &what)
    }

    async fn read_commit_tree(
        &self,
        coords: &RepoCoordinates,
        commit: &ObjectId,
    ) -> StoreResult<ObjectId> {
        let what = format!("commit {} of {coords}", commit.short_hex());
        let url = self.repo_url(coords, &format!("git/commits/{commit}"));
        let response = expect(self.get(&url).await?, &[StatusCode::OK], &what).await?;
        let body: CommitResponse = decode(response, &what).await?;
        object_id(&body.tree.sha, &what)
    }

    async fn create_tree(
        &self,
        coords: &RepoCoordinates,
        base_tree: &ObjectId,
        entries: &[TreeEntry],
    ) -> StoreResult<ObjectId> {
        let what = format!("create tree on {coords}");
        let request = CreateTreeRequest {
            base_tree: base_tree.as_str(),
            tree: entries.iter().map(WireTreeEntry::from).collect(),
        };
        let url = self.repo_url(coords, "git/trees");
        let response = self.send(Method::POST, &url, Some(&request)).await?;
        let response = expect(response, &[StatusCode::CREATED], &what).await?;
        let body: crate::wire::ShaOnly = decode(response, &what).await?;
        object_id(&body.sha, &what)
    }

    async fn create_commit(
        &self,
        coords: &RepoCoordinates,
        tree: &ObjectId,
        parent: &ObjectId,
        message: &str,
    ) -> StoreResult<ObjectId> {
        let what = format!("create commit on {coords}");
        let request = CreateCommitRequest {
            message,
            tree: tree.as_str(),
            parents: vec![parent.as_str()],
        };
        let url = self.repo_url(coords, "git/commits");
        let response = self.send(Method::POST, &url, Some(&request)).await?;
        let response = expect(response, &[StatusCode::CREATED], &what).await?;
        let body: crate::wire::ShaOnly = decode(response, &what).await?;
        object_id(&body.sha, &what)
    }

    async fn update_branch_head(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
        commit: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> StoreResult<()> {
        let what = format!("update branch {branch} of {coords}");

        // The API has no compare-and-swap on refs. Re-reading the head
        // narrows the race window; `force: false` makes the platform refuse
        // anything that is not a fast-forward.
        if let Some(expected) = expected {
            let current = self.resolve_branch_head(coords, branch).await?;
            if &current != expected {
                return Err(StoreError::Conflict(format!(
                    "{what}: head moved from {} to {}",
                    expected.short_hex(),
                    current.short_hex()
                )));
            }
        }

        let request = UpdateRefRequest {
            sha: commit.as_str(),
            force: false,
        };
        let url = self.repo_url(coords, &format!("git/refs/heads/{branch}"));
        let response = self.send(Method::PATCH, &url, Some(&request)).await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let message = error_message(response).await;
        if status == StatusCode::UNPROCESSABLE_ENTITY
            && message.to_ascii_lowercase().contains("fast forward")
        {
            return Err(StoreError::Conflict(format!("{what}: {message}")));
        }
        Err(classify(status, &what, &message))
    }

    async fn create_branch(
        &self,
        coords: &RepoCoordinates,
        branch: &str,
        commit: &ObjectId,
    ) -> StoreResult<()> {
        let what = format!("create branch {branch} on {coords}");
        let request = CreateRefRequest {
            reference: format!("refs/heads/{branch}"),
            sha: commit.as_str(),
        };
        let url = self.repo_url(coords, "git/refs");
        let response = self.send(Method::POST, &url, Some(&request)).await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(());
        }
        let message = error_message(response).await;
        if status == StatusCode::UNPROCESSABLE_ENTITY
            && message.to_ascii_lowercase().contains("already exists")
        {
            return Err(StoreError::Conflict(format!("{what}: {message}")));
        }
        Err(classify(status, &what, &message))
    }

    async fn delete_branch(&self, coords: &RepoCoordinates, branch: &str) -> StoreResult<()> {
        let what = format!("delete branch {branch} on {coords}");
        let url = self.repo_url(coords, &format!("git/refs/heads/{branch}"));
        let response = self.send::<()>(Method::DELETE, &url, None).await?;
        expect(response, &[StatusCode::NO_CONTENT], &what).await?;
        Ok(())
    }

    async fn open_pull_request(
        &self,
        coords: &RepoCoordinates,
        spec: &PullRequestSpec,
    ) -> StoreResult<PullRequest> {
        let what = format!("open pull request {} -> {} on {coords}", spec.head, spec.base);
        let request = CreatePullRequest {
            title: &spec.title,
            head: &spec.head,
            base: &spec.base,
            body: spec.body.as_deref(),
        };
        let url = self.repo_url(coords, "pulls");
        let response = self.send(Method::POST, &url, Some(&request)).await?;
        let response = expect(response, &[StatusCode::CREATED], &what).await?;
        let body: PullResponse = decode(response, &what).await?;
        Ok(PullRequest {
            number: body.number,
            url: body.html_url,
        })
    }

    async fn read_blob(&self, coords: &RepoCoordinates, path: &str) -> StoreResult<BlobContent> {
        let what = format!("file {path} of {coords}");
        let url = self.repo_url(coords, &format!("contents/{path}"));
        let response = expect(self.get(&url).await?, &[StatusCode::OK], &what).await?;
        let body: ContentResponse = decode(response, &what).await?;
        match body.encoding.as_deref() {
            None | Some("base64") => {}
            Some(other) => {
                return Err(StoreError::Malformed(format!(
                    "{what}: unsupported content encoding {other:?}"
                )));
            }
        }
        Ok(BlobContent {
            path: path.to_string(),
            content: body.content.chars().filter(|c| !c.is_ascii_whitespace()).collect(),
            content_id: object_id(&body.sha, &what)?,
        })
    }

    async fn write_blob(
        &self,
        coords: &RepoCoordinates,
        path: &str,
        content: &str,
        previous: Option<&ObjectId>,
        message: &str,
    ) -> StoreResult<ObjectId> {
        let what = format!("write file {path} of {coords}");
        let request = PutContentRequest {
            message,
            content,
            sha: previous.map(ObjectId::as_str),
        };
        let url = self.repo_url(coords, &format!("contents/{path}"));
        let response = self.send(Method::PUT, &url, Some(&request)).await?;
        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            let body: PutContentResponse = decode(response, &what).await?;
            return object_id(&body.content.sha, &what);
        }
        let message = error_message(response).await;
        // A missing or mismatched sha on an existing file is reported as 422.
        if status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("sha") {
            return Err(StoreError::Conflict(format!("{what}: {message}")));
        }
        Err(classify(status, &what, &message))
    }

    async fn delete_blob(
        &self,
        coords: &RepoCoordinates,
        path: &str,
        previous: &ObjectId,
        message: &str,
    ) -> StoreResult<()> {
        let what = format!("delete file {path} of {coords}");
        let request = DeleteContentRequest {
            message,
            sha: previous.as_str(),
        };
        let url = self.repo_url(coords, &format!("contents/{path}"));
        let response = self.send(Method::DELETE, &url, Some(&request)).await?;
        expect(response, &[StatusCode::OK], &what).await?;
        Ok(())
    }
}
