//! GitLab REST v4 client.
//!
//! Implements [`DiffSource`] over the merge request endpoints and
//! [`ReportSink`] over the notes endpoint. All requests carry the
//! `PRIVATE-TOKEN` header and a bounded timeout; the note post gets its own,
//! longer bound.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Commit, DiffSource, FileChange, MergeRequest};
use crate::error::{GateError, IntoGateError, Result};
use crate::report::ReportSink;

/// Page size for paginated list endpoints (GitLab's maximum).
const PER_PAGE: &str = "100";

/// Connection settings for one merge request.
#[derive(Debug, Clone)]
pub struct GitLabSettings {
    /// API root, e.g. `https://gitlab.com/api/v4`.
    pub api_url: String,
    /// Personal/project access token.
    pub token: String,
    /// Numeric project id or `group/project` path.
    pub project_id: String,
    /// Merge request IID within the project.
    pub mr_iid: u64,
    /// Timeout for every read request.
    pub read_timeout: Duration,
    /// Timeout for posting the report note.
    pub post_timeout: Duration,
}

impl GitLabSettings {
    /// Settings with the default 30s read and 60s post timeouts.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        project_id: impl Into<String>,
        mr_iid: u64,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            project_id: project_id.into(),
            mr_iid,
            read_timeout: Duration::from_secs(30),
            post_timeout: Duration::from_secs(60),
        }
    }

    /// Override both timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, read: Duration, post: Duration) -> Self {
        self.read_timeout = read;
        self.post_timeout = post;
        self
    }
}

#[derive(Deserialize)]
struct ApiMergeRequest {
    title: String,
    description: Option<String>,
    #[serde(default)]
    source_branch: String,
}

#[derive(Deserialize)]
struct ApiCommit {
    short_id: String,
    title: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ApiChanges {
    #[serde(default)]
    changes: Vec<ApiChange>,
    /// Set when GitLab cut the list at its diff limit.
    #[serde(default)]
    overflow: bool,
}

impl ApiChanges {
    fn into_file_changes(self) -> Vec<FileChange> {
        if self.overflow {
            warn!(
                "GitLab truncated the change list at {} file(s); files beyond the limit are not checked",
                self.changes.len()
            );
        }
        self.changes
            .into_iter()
            .map(|c| FileChange {
                path: c.new_path,
                deleted: c.deleted_file,
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct ApiChange {
    new_path: String,
    #[serde(default)]
    deleted_file: bool,
}

/// GitLab client bound to a single merge request.
pub struct GitLabClient {
    http: Client,
    settings: GitLabSettings,
    base: Url,
}

impl GitLabClient {
    /// Build a client for the given settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the API URL is not a valid base URL,
    /// the token is not a valid header value, or the HTTP client cannot be
    /// constructed.
    pub fn new(settings: GitLabSettings) -> Result<Self> {
        let base = Url::parse(&settings.api_url).map_err(|e| GateError::InvalidConfig {
            field: "gitlab.api_url".to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(GateError::InvalidConfig {
                field: "gitlab.api_url".to_string(),
                reason: format!("'{}' cannot be used as a base URL", settings.api_url),
            });
        }

        let mut token = HeaderValue::from_str(&settings.token).map_err(|_| {
            GateError::InvalidConfig {
                field: "token".to_string(),
                reason: "contains characters not allowed in an HTTP header".to_string(),
            }
        })?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("PRIVATE-TOKEN", token);

        let http = Client::builder()
            .user_agent(concat!("mrgate/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(settings.read_timeout)
            .build()
            .map_err(|e| GateError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            settings,
            base,
        })
    }

    /// The settings this client was built with.
    #[must_use]
    pub fn settings(&self) -> &GitLabSettings {
        &self.settings
    }

    /// URL for `projects/:id/<segments...>` with every segment encoded.
    ///
    /// Segment encoding turns `group/project` and nested file paths into
    /// single `%2F`-escaped segments as the API requires.
    fn project_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("projects")
                .push(&self.settings.project_id)
                .extend(segments);
        }
        url
    }

    fn mr_url(&self, tail: &[&str]) -> Url {
        let iid = self.settings.mr_iid.to_string();
        let mut segments = vec!["merge_requests", iid.as_str()];
        segments.extend_from_slice(tail);
        self.project_url(&segments)
    }

    async fn get_ok(&self, url: Url, what: &str) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .into_gate_fetch(what)?;
        ensure_success(response, what).await
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GateError::fatal_fetch(
        what,
        format!("GitLab returned {}: {}", status, body.trim()),
    ))
}

/// Next page number from GitLab's `x-next-page` header, if any.
fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("x-next-page")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl DiffSource for GitLabClient {
    async fn fetch_metadata(&self) -> Result<MergeRequest> {
        let response = self.get_ok(self.mr_url(&[]), "merge request metadata").await?;
        let mr: ApiMergeRequest = response
            .json()
            .await
            .into_gate_fetch("merge request metadata")?;
        Ok(MergeRequest {
            title: mr.title,
            description: mr.description.unwrap_or_default(),
            source_branch: mr.source_branch,
        })
    }

    async fn fetch_commits(&self) -> Result<Vec<Commit>> {
        let mut commits = Vec::new();
        let mut page = 1u32;

        loop {
            let mut url = self.mr_url(&["commits"]);
            url.query_pairs_mut()
                .append_pair("per_page", PER_PAGE)
                .append_pair("page", &page.to_string());

            let response = self.get_ok(url, "commits").await?;
            let next = next_page(&response);
            let batch: Vec<ApiCommit> = response
                .json()
                .await
                .into_gate_fetch("commits")?;

            commits.extend(batch.into_iter().map(|c| Commit {
                short_id: c.short_id,
                title: c.title,
                message: c.message,
            }));

            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        debug!("fetched {} commits", commits.len());
        Ok(commits)
    }

    async fn fetch_changed_files(&self) -> Result<Vec<FileChange>> {
        let response = self.get_ok(self.mr_url(&["changes"]), "changed files").await?;
        let body: ApiChanges = response.json().await.into_gate_fetch("changed files")?;
        Ok(body.into_file_changes())
    }

    async fn fetch_file_content(&self, path: &str, git_ref: &str) -> String {
        let mut url = self.project_url(&["repository", "files", path, "raw"]);
        url.query_pairs_mut().append_pair("ref", git_ref);

        let result = async {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            let status = response.status();
            if !status.is_success() {
                return Err(format!("GitLab returned {}", status));
            }
            response.text().await.map_err(|e| e.to_string())
        }
        .await;

        match result {
            Ok(content) => content,
            Err(message) => {
                let err = GateError::SoftFetch {
                    path: path.to_string(),
                    git_ref: git_ref.to_string(),
                    message,
                };
                warn!("{}", err);
                String::new()
            }
        }
    }
}

#[async_trait]
impl ReportSink for GitLabClient {
    async fn post_report(&self, body: &str) -> Result<()> {
        let url = self.mr_url(&["notes"]);
        debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .timeout(self.settings.post_timeout)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| GateError::sink_post(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GateError::sink_post(format!(
                "GitLab returned {}: {}",
                status,
                text.trim()
            )));
        }

        info!("posted report to merge request !{}", self.settings.mr_iid);
        Ok(())
    }
}
