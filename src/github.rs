//! GitHub REST Client
//!
//! Typed wrapper over the handful of GitHub REST calls the bump workflow
//! needs: tag listing, content fetch, branch creation, content commit,
//! pull-request creation and review approval. Each remote call is one
//! method on the [`GitHost`] trait so tests can substitute deterministic
//! fixtures for the real service.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = "release-bump-bot";
const API_VERSION: &str = "2022-11-28";

// ============================================================
// API Types
// ============================================================

/// A tag as returned by the tag listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: CommitRef,
}

/// Commit pointer embedded in listings and update responses.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// A file's committed state: path, blob sha and base64 body.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub sha: String,
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

/// Parameters for committing new content to a branch.
///
/// `sha` is the blob sha of the file being replaced; the remote rejects the
/// update if the file changed underneath us.
#[derive(Debug, Clone, Serialize)]
pub struct FileUpdate {
    #[serde(skip)]
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: String,
    pub branch: String,
}

/// Response to a content update; `commit` is the commit that was created.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatedFile {
    pub commit: CommitRef,
}

#[derive(Debug, Serialize)]
struct CreateBranchRequest {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: String,
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

/// A created pull request: its number and the refs it connects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: BranchRef,
    pub base: BranchRef,
    pub html_url: Option<String>,
}

/// One end of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Serialize)]
struct ReviewRequest {
    event: String,
    body: String,
    commit_id: String,
}

/// A submitted pull-request review.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub id: u64,
}

// ============================================================
// Host Abstraction
// ============================================================

/// One method per remote call the workflow performs.
///
/// The workflow only talks to this trait; the binary hands it a
/// [`GitHubClient`], tests hand it an in-memory double.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// List the repository's tags.
    async fn list_tags(&self) -> Result<Vec<Tag>>;

    /// Fetch a file's current committed state.
    async fn get_content(&self, path: &str) -> Result<FileContent>;

    /// Create `refs/heads/{branch}` pointing at `sha`.
    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()>;

    /// Commit new content to a branch.
    async fn update_content(&self, update: &FileUpdate) -> Result<UpdatedFile>;

    /// Open a pull request.
    async fn create_pull_request(&self, pull_request: &NewPullRequest) -> Result<PullRequest>;

    /// Submit an APPROVE review for a pull request.
    async fn approve_pull_request(&self, number: u64, commit_id: &str, body: &str)
        -> Result<Review>;
}

// ============================================================
// Client Implementation
// ============================================================

/// GitHub API client bound to one repository and token.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GitHubClient {
    /// Create a new client for `owner/repo` authenticating with `token`.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_url: GITHUB_API.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    /// Override the API base URL (e.g. for GitHub Enterprise).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, tail)
    }

    fn auth_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", self.token).parse().unwrap(),
        );
        headers.insert("Accept", "application/vnd.github+json".parse().unwrap());
        headers.insert("X-GitHub-Api-Version", API_VERSION.parse().unwrap());
        headers
    }
}

/// Surface non-2xx responses verbatim, parse everything else.
async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("GitHub API error ({}): {}", status, body);
    }

    response
        .json::<T>()
        .await
        .context("Failed to parse GitHub response")
}

#[async_trait]
impl GitHost for GitHubClient {
    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let url = self.repo_url("tags");
        debug!(%url, "listing tags");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .await
            .context("Failed to list tags")?;

        parse_response(response).await
    }

    async fn get_content(&self, path: &str) -> Result<FileContent> {
        let url = self.repo_url(&format!("contents/{}", path));
        debug!(%url, "fetching file content");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .await
            .with_context(|| format!("Failed to fetch content of {}", path))?;

        parse_response(response).await
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        let url = self.repo_url("git/refs");
        debug!(%url, branch, sha, "creating branch ref");

        let request = CreateBranchRequest {
            git_ref: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to create branch {}", branch))?;

        parse_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn update_content(&self, update: &FileUpdate) -> Result<UpdatedFile> {
        let url = self.repo_url(&format!("contents/{}", update.path));
        debug!(%url, branch = %update.branch, "committing content update");

        let response = self
            .client
            .put(&url)
            .headers(self.auth_headers())
            .json(update)
            .send()
            .await
            .with_context(|| format!("Failed to update content of {}", update.path))?;

        parse_response(response).await
    }

    async fn create_pull_request(&self, pull_request: &NewPullRequest) -> Result<PullRequest> {
        let url = self.repo_url("pulls");
        debug!(%url, head = %pull_request.head, base = %pull_request.base, "opening pull request");

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(pull_request)
            .send()
            .await
            .context("Failed to create pull request")?;

        parse_response(response).await
    }

    async fn approve_pull_request(
        &self,
        number: u64,
        commit_id: &str,
        body: &str,
    ) -> Result<Review> {
        let url = self.repo_url(&format!("pulls/{}/reviews", number));
        debug!(%url, commit_id, "approving pull request");

        let request = ReviewRequest {
            event: "APPROVE".to_string(),
            body: body.to_string(),
            commit_id: commit_id.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to approve pull request #{}", number))?;

        parse_response(response).await
    }
}

// ============================================================
// Content Encoding
// ============================================================

/// Decode a contents-API body. GitHub wraps the base64 at 60 columns, so
/// embedded whitespace is stripped before decoding.
pub fn decode_content(content: &str) -> Result<String> {
    let compact: String = content.split_whitespace().collect();
    let bytes = general_purpose::STANDARD
        .decode(compact)
        .context("Failed to decode base64 content")?;

    String::from_utf8(bytes).context("File content is not valid UTF-8")
}

/// Encode content for the contents API.
pub fn encode_content(content: &str) -> String {
    general_purpose::STANDARD.encode(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_content_ignores_line_wrapping() {
        let encoded = "eyJiYXNlQnJhbmNo\nZXMiOiBbIm1haW4i\nXX0=\n";
        let decoded = decode_content(encoded).unwrap();
        assert_eq!(decoded, r#"{"baseBranches": ["main"]}"#);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let original = "# Title\n\nSome readme text.\n";
        assert_eq!(decode_content(&encode_content(original)).unwrap(), original);
    }

    #[test]
    fn test_create_branch_request_uses_ref_key() {
        let request = CreateBranchRequest {
            git_ref: "refs/heads/bump-to-next-minor-version-42".to_string(),
            sha: "1234".to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"ref\":\"refs/heads/bump-to-next-minor-version-42\""));
        assert!(json.contains("\"sha\":\"1234\""));
    }

    #[test]
    fn test_file_update_serialization_skips_path() {
        let update = FileUpdate {
            path: "README.md".to_string(),
            message: "msg".to_string(),
            content: "Zm9v".to_string(),
            sha: "abc".to_string(),
            branch: "bump".to_string(),
        };

        let json = serde_json::to_string(&update).unwrap();
        assert!(!json.contains("README.md"));
        assert!(json.contains("\"branch\":\"bump\""));
    }

    #[test]
    fn test_pull_request_deserialization() {
        let body = r#"{
            "number": 7,
            "head": {"ref": "bump-to-next-minor-version-42", "sha": "beef"},
            "base": {"ref": "release-2"},
            "html_url": "https://github.com/acme/widgets/pull/7"
        }"#;

        let pull_request: PullRequest = serde_json::from_str(body).unwrap();
        assert_eq!(pull_request.number, 7);
        assert_eq!(pull_request.head.git_ref, "bump-to-next-minor-version-42");
        assert_eq!(pull_request.base.git_ref, "release-2");
    }

    #[tokio::test]
    #[ignore] // Requires network access and GITHUB_TOKEN
    async fn test_list_tags_live() {
        let token = std::env::var("GITHUB_TOKEN").unwrap();
        let client = GitHubClient::new("rust-lang", "rust", token);
        let tags = client.list_tags().await.unwrap();
        assert!(!tags.is_empty());
    }
}
