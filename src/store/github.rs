//! GitHub contents API backend

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ContentStore, RemoteEntry, RemoteFile};
use crate::config::GithubConfig;
use crate::error::{CmsError, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// File metadata returned by `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Body of a create/update request
#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

/// Body of a delete request
#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
}

/// Content store backed by a GitHub repository
pub struct GithubStore {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubStore {
    pub fn new(config: GithubConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("blog-cms/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.contents_url(path))
            .header(AUTHORIZATION, format!("token {}", self.config.token))
            .header(ACCEPT, GITHUB_ACCEPT)
    }

    /// GET a path on the configured branch; `None` on 404
    async fn get(&self, path: &str) -> Result<Option<Response>> {
        let resp = self
            .request(Method::GET, path)
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(resp)),
            status => Err(CmsError::remote(format!("GitHub API error: {}", status.as_u16()))),
        }
    }
}

#[async_trait]
impl ContentStore for GithubStore {
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>> {
        let Some(resp) = self.get(dir).await? else {
            tracing::debug!("Directory {} not found, treating as empty", dir);
            return Ok(Vec::new());
        };
        resp.json()
            .await
            .map_err(|e| CmsError::remote(format!("Unexpected listing for {}: {}", dir, e)))
    }

    async fn read(&self, path: &str) -> Result<Option<RemoteFile>> {
        let Some(resp) = self.get(path).await? else {
            return Ok(None);
        };
        let file: ContentsFile = resp
            .json()
            .await
            .map_err(|e| CmsError::remote(format!("Unexpected file payload for {}: {}", path, e)))?;

        Ok(Some(RemoteFile {
            path: path.to_string(),
            content: decode_content(&file.content)?,
            sha: file.sha,
        }))
    }

    async fn fetch_hash(&self, path: &str) -> Result<Option<String>> {
        let Some(resp) = self.get(path).await? else {
            return Ok(None);
        };
        let file: ContentsFile = resp
            .json()
            .await
            .map_err(|e| CmsError::remote(format!("Unexpected file payload for {}: {}", path, e)))?;
        Ok(Some(file.sha))
    }

    async fn write(&self, path: &str, content: &str, expected_hash: Option<&str>) -> Result<()> {
        let body = PutRequest {
            message: commit_message(path, expected_hash),
            content: encode_content(content),
            sha: expected_hash,
            branch: &self.config.branch,
        };

        let resp = self.request(Method::PUT, path).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(api_error(resp, "Failed to save file").await);
        }

        tracing::info!("{}", body.message);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let sha = self
            .fetch_hash(path)
            .await?
            .ok_or_else(|| CmsError::not_found("File not found"))?;

        let body = DeleteRequest {
            message: format!("Delete post: {}", path),
            sha: &sha,
            branch: &self.config.branch,
        };

        let resp = self.request(Method::DELETE, path).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(api_error(resp, "Failed to delete file").await);
        }

        tracing::info!("{}", body.message);
        Ok(())
    }
}

fn commit_message(path: &str, expected_hash: Option<&str>) -> String {
    match expected_hash {
        Some(_) => format!("Update post: {}", path),
        None => format!("Create post: {}", path),
    }
}

/// Base64 of the UTF-8 bytes
fn encode_content(content: &str) -> String {
    BASE64.encode(content.as_bytes())
}

/// GitHub wraps base64 payloads at 60 columns
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| CmsError::remote(format!("Invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| CmsError::remote(format!("Content is not UTF-8: {}", e)))
}

/// Turn a failed response into a `Remote` error carrying GitHub's message
async fn api_error(resp: Response, fallback: &str) -> CmsError {
    let status = resp.status().as_u16();
    let message = resp
        .json::<ApiError>()
        .await
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty());

    CmsError::Remote(message.unwrap_or_else(|| format!("{}: {}", fallback, status)))
}
