//! GitHub content store settings

use crate::error::{CmsError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";

/// Settings for the GitHub-backed content store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_url: String,
}

impl GithubConfig {
    /// Build a config from optional parts, checking the required ones once.
    ///
    /// Blank values count as missing. `branch` and `api_url` fall back to
    /// their defaults.
    pub fn from_parts(
        token: Option<String>,
        owner: Option<String>,
        repo: Option<String>,
        branch: Option<String>,
        api_url: Option<String>,
    ) -> Result<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let (Some(token), Some(owner), Some(repo)) =
            (present(token), present(owner), present(repo))
        else {
            return Err(CmsError::Configuration(
                "GitHub configuration missing".to_string(),
            ));
        };

        Ok(Self {
            token,
            owner,
            repo,
            branch: present(branch).unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            api_url: present(api_url)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    /// Contents API URL for a repository path
    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            GithubConfig::from_parts(some("t"), some("me"), some("blog"), None, None).unwrap();
        assert_eq!(config.branch, "main");
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(
            config.contents_url("content/posts/a.md"),
            "https://api.github.com/repos/me/blog/contents/content/posts/a.md"
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let cases = [
            (None, some("me"), some("blog")),
            (some("t"), None, some("blog")),
            (some("t"), some("me"), some("  ")),
        ];
        for (token, owner, repo) in cases {
            let err = GithubConfig::from_parts(token, owner, repo, None, None).unwrap_err();
            assert!(matches!(err, CmsError::Configuration(_)));
        }
    }

    #[test]
    fn test_custom_branch_and_api() {
        let config = GithubConfig::from_parts(
            some("t"),
            some("me"),
            some("blog"),
            some("drafts"),
            some("http://localhost:9000/"),
        )
        .unwrap();
        assert_eq!(config.branch, "drafts");
        assert_eq!(config.contents_url("x.md"), "http://localhost:9000/repos/me/blog/contents/x.md");
    }
}
