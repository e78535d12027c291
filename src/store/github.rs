//! GitHub REST binding for the object store
//!
//! Speaks the Git database endpoints of the GitHub REST API. One store
//! instance is scoped to a single owner/repo pair and authenticates every
//! request with a static bearer token. No retries; every failure surfaces
//! immediately as a typed error.

use crate::error::{GraftError, StoreReadError, StoreWriteError};
use crate::store::ObjectStore;
use crate::types::{EntryKind, FileMode, NewCommit, ObjectId, TreeEntry};
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("graft/", env!("CARGO_PKG_VERSION"));

/// Remote repository coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Repository owner (user or organization)
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Branch the sync engine reads and advances
    #[serde(default = "default_branch")]
    pub branch: String,

    /// API base URL, overridable for GitHub Enterprise hosts
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            api_base: default_api_base(),
        }
    }
}

impl RemoteConfig {
    /// Validate remote coordinates
    pub fn validate(&self) -> Result<(), String> {
        if self.owner.is_empty() {
            return Err("remote owner cannot be empty".to_string());
        }
        if self.repo.is_empty() {
            return Err("remote repo cannot be empty".to_string());
        }
        if self.branch.is_empty() {
            return Err("remote branch cannot be empty".to_string());
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(format!("api_base must be an HTTP(S) URL: {}", self.api_base));
        }
        Ok(())
    }
}

/// HTTP client tuning for the hosted binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whole-operation deadline in seconds (None = wait indefinitely)
    #[serde(default)]
    pub operation_timeout_secs: Option<u64>,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            operation_timeout_secs: None,
        }
    }
}

impl HttpConfig {
    /// Configured whole-operation deadline, if any.
    pub fn operation_deadline(&self) -> Option<Duration> {
        self.operation_timeout_secs.map(Duration::from_secs)
    }
}

fn build_http_client(http: &HttpConfig) -> Result<Client, GraftError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .timeout(Duration::from_secs(http.request_timeout_secs))
        .build()
        .map_err(|e| GraftError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Object store backed by the GitHub Git database API.
pub struct GitHubStore {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubStore {
    /// Build a store for one remote repository.
    pub fn new(
        remote: &RemoteConfig,
        token: impl Into<String>,
        http: &HttpConfig,
    ) -> Result<Self, GraftError> {
        remote.validate().map_err(GraftError::Config)?;
        let client = build_http_client(http)?;
        Ok(Self {
            client,
            api_base: remote.api_base.trim_end_matches('/').to_string(),
            owner: remote.owner.clone(),
            repo: remote.repo.clone(),
            token: token.into(),
        })
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, tail
        )
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        context: &str,
        response: Response,
    ) -> Result<T, StoreReadError> {
        response.json().await.map_err(|e| StoreReadError::Malformed {
            context: context.to_string(),
            detail: e.to_string(),
        })
    }
}

fn read_transport(context: &str, err: reqwest::Error) -> StoreReadError {
    StoreReadError::Transport {
        context: context.to_string(),
        detail: err.to_string(),
    }
}

fn write_transport(context: &str, err: reqwest::Error) -> StoreWriteError {
    StoreWriteError::Transport {
        context: context.to_string(),
        detail: err.to_string(),
    }
}

async fn status_detail(response: Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    format!("status {}: {}", status, body)
}

async fn read_failure(context: &str, response: Response) -> StoreReadError {
    StoreReadError::Transport {
        context: context.to_string(),
        detail: status_detail(response).await,
    }
}

/// Non-success write responses: client errors mean the store refused the
/// object, anything else is transport trouble.
async fn write_failure(context: &str, response: Response) -> StoreWriteError {
    let client_error = response.status().is_client_error();
    let detail = status_detail(response).await;
    if client_error {
        StoreWriteError::Rejected {
            context: context.to_string(),
            detail,
        }
    } else {
        StoreWriteError::Transport {
            context: context.to_string(),
            detail,
        }
    }
}

fn convert_entry(wire: WireTreeEntry) -> Result<TreeEntry, StoreReadError> {
    let mode = FileMode::from_wire(&wire.mode).ok_or_else(|| StoreReadError::Malformed {
        context: "listing tree".to_string(),
        detail: format!("unknown entry mode '{}' at {}", wire.mode, wire.path),
    })?;
    let kind = EntryKind::from_wire(&wire.kind).ok_or_else(|| StoreReadError::Malformed {
        context: "listing tree".to_string(),
        detail: format!("unknown entry type '{}' at {}", wire.kind, wire.path),
    })?;
    Ok(TreeEntry {
        path: wire.path,
        mode,
        kind,
        id: ObjectId::new(wire.sha),
    })
}

#[async_trait]
impl ObjectStore for GitHubStore {
    async fn branch_head(&self, branch: &str) -> Result<ObjectId, StoreReadError> {
        let context = "resolving branch head";
        let url = self.repo_url(&format!("git/refs/heads/{}", branch));
        let response = self
            .decorate(self.client.get(&url))
            .send()
            .await
            .map_err(|e| read_transport(context, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreReadError::BranchNotFound(branch.to_string()));
        }
        if !response.status().is_success() {
            return Err(read_failure(context, response).await);
        }

        let reference: RefResponse = Self::parse_json(context, response).await?;
        debug!(branch = %branch, head = %reference.object.sha, "Resolved branch head");
        Ok(ObjectId::new(reference.object.sha))
    }

    async fn commit_tree(&self, commit: &ObjectId) -> Result<ObjectId, StoreReadError> {
        let context = "resolving commit tree";
        let url = self.repo_url(&format!("git/commits/{}", commit));
        let response = self
            .decorate(self.client.get(&url))
            .send()
            .await
            .map_err(|e| read_transport(context, e))?;

        if response.status() == StatusCode::NOT_FOUND
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(StoreReadError::ObjectNotFound(commit.clone()));
        }
        if !response.status().is_success() {
            return Err(read_failure(context, response).await);
        }

        let body: CommitResponse = Self::parse_json(context, response).await?;
        Ok(ObjectId::new(body.tree.sha))
    }

    async fn create_blob(&self, content: &str) -> Result<ObjectId, StoreWriteError> {
        let context = "creating blob";
        let url = self.repo_url("git/blobs");
        let request = BlobRequest {
            content: BASE64_STANDARD.encode(content.as_bytes()),
            encoding: "base64",
        };
        let response = self
            .decorate(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| write_transport(context, e))?;

        if !response.status().is_success() {
            return Err(write_failure(context, response).await);
        }

        let body: ShaResponse =
            response
                .json()
                .await
                .map_err(|e| StoreWriteError::Transport {
                    context: context.to_string(),
                    detail: format!("unreadable response: {}", e),
                })?;
        Ok(ObjectId::new(body.sha))
    }

    async fn create_tree(
        &self,
        entries: &[TreeEntry],
        base_tree: &ObjectId,
    ) -> Result<ObjectId, StoreWriteError> {
        let context = "creating tree";
        let url = self.repo_url("git/trees");
        let request = TreeRequest {
            base_tree: base_tree.as_str(),
            tree: entries.iter().map(WireTreeEntry::from).collect(),
        };
        let response = self
            .decorate(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| write_transport(context, e))?;

        if !response.status().is_success() {
            return Err(write_failure(context, response).await);
        }

        let body: ShaResponse =
            response
                .json()
                .await
                .map_err(|e| StoreWriteError::Transport {
                    context: context.to_string(),
                    detail: format!("unreadable response: {}", e),
                })?;
        debug!(tree = %body.sha, entries = entries.len(), "Created tree");
        Ok(ObjectId::new(body.sha))
    }

    async fn create_commit(&self, commit: &NewCommit) -> Result<ObjectId, StoreWriteError> {
        let context = "creating commit";
        let url = self.repo_url("git/commits");
        let request = CommitRequest {
            message: &commit.message,
            tree: commit.tree.as_str(),
            parents: commit.parents.iter().map(|p| p.as_str()).collect(),
            author: commit.author.as_ref().map(|a| WireAuthor {
                name: &a.name,
                email: &a.email,
                date: a.timestamp.to_rfc3339(),
            }),
        };
        let response = self
            .decorate(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| write_transport(context, e))?;

        if !response.status().is_success() {
            return Err(write_failure(context, response).await);
        }

        let body: ShaResponse =
            response
                .json()
                .await
                .map_err(|e| StoreWriteError::Transport {
                    context: context.to_string(),
                    detail: format!("unreadable response: {}", e),
                })?;
        Ok(ObjectId::new(body.sha))
    }

    async fn update_branch(&self, branch: &str, commit: &ObjectId) -> Result<(), StoreWriteError> {
        let url = self.repo_url(&format!("git/refs/heads/{}", branch));
        let request = RefUpdateRequest {
            sha: commit.as_str(),
        };
        let response = self
            .decorate(self.client.patch(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| write_transport("updating branch ref", e))?;

        // 422 covers non-fast-forward rejections and unknown commits.
        if response.status().is_client_error() {
            return Err(StoreWriteError::RefRejected {
                branch: branch.to_string(),
                detail: status_detail(response).await,
            });
        }
        if !response.status().is_success() {
            return Err(write_failure("updating branch ref", response).await);
        }
        debug!(branch = %branch, commit = %commit, "Advanced branch ref");
        Ok(())
    }

    async fn read_tree(&self, tree: &ObjectId) -> Result<Vec<TreeEntry>, StoreReadError> {
        let context = "listing tree";
        let url = self.repo_url(&format!("git/trees/{}", tree));
        let response = self
            .decorate(self.client.get(&url))
            .send()
            .await
            .map_err(|e| read_transport(context, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreReadError::ObjectNotFound(tree.clone()));
        }
        if !response.status().is_success() {
            return Err(read_failure(context, response).await);
        }

        let listing: TreeListing = Self::parse_json(context, response).await?;
        // A truncated listing would silently drop entries.
        if listing.truncated {
            return Err(StoreReadError::Malformed {
                context: context.to_string(),
                detail: format!("listing of {} truncated by the host", tree),
            });
        }
        listing.tree.into_iter().map(convert_entry).collect()
    }

    async fn read_file(&self, branch: &str, path: &str) -> Result<String, StoreReadError> {
        let context = "fetching file content";
        let url = self.repo_url(&format!("contents/{}", path));
        let response = self
            .decorate(self.client.get(&url))
            .query(&[("ref", branch)])
            .send()
            .await
            .map_err(|e| read_transport(context, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreReadError::PathNotFound {
                path: path.to_string(),
                reference: branch.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(read_failure(context, response).await);
        }

        let body: ContentResponse = Self::parse_json(context, response).await?;
        if body.encoding != "base64" {
            return Err(StoreReadError::Malformed {
                context: context.to_string(),
                detail: format!("unexpected content encoding '{}'", body.encoding),
            });
        }
        decode_content(context, path, &body.content)
    }
}

/// The content field arrives base64 with embedded line breaks.
fn decode_content(context: &str, path: &str, raw: &str) -> Result<String, StoreReadError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64_STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| StoreReadError::Malformed {
            context: context.to_string(),
            detail: format!("invalid base64 for {}: {}", path, e),
        })?;
    String::from_utf8(bytes).map_err(|_| StoreReadError::Malformed {
        context: context.to_string(),
        detail: format!("{} is not UTF-8 text", path),
    })
}

#[derive(Debug, Serialize)]
struct BlobRequest {
    content: String,
    encoding: &'static str,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Serialize)]
struct TreeRequest<'a> {
    base_tree: &'a str,
    tree: Vec<WireTreeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireTreeEntry {
    path: String,
    mode: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

impl From<&TreeEntry> for WireTreeEntry {
    fn from(entry: &TreeEntry) -> Self {
        WireTreeEntry {
            path: entry.path.clone(),
            mode: entry.mode.as_wire().to_string(),
            kind: entry.kind.as_wire().to_string(),
            sha: entry.id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<WireAuthor<'a>>,
}

#[derive(Debug, Serialize)]
struct WireAuthor<'a> {
    name: &'a str,
    email: &'a str,
    date: String,
}

#[derive(Debug, Serialize)]
struct RefUpdateRequest<'a> {
    sha: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    tree: TreeRef,
}

#[derive(Debug, Deserialize)]
struct TreeRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeListing {
    #[serde(default)]
    truncated: bool,
    tree: Vec<WireTreeEntry>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: String,
    encoding: String,
}
