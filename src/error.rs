//! Error types shared by the store, repository and HTTP layers

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CmsError>;

/// Errors raised while managing posts
#[derive(Debug, Error)]
pub enum CmsError {
    /// Bad slug, empty title or a malformed request payload
    #[error("{0}")]
    Validation(String),

    /// The post or file does not exist in the store
    #[error("{0}")]
    NotFound(String),

    /// The remote store answered with a failure or an unreadable payload
    #[error("{0}")]
    Remote(String),

    /// A stored file does not carry a well-formed front-matter header
    #[error("{0}")]
    Format(String),

    /// Required store settings are missing
    #[error("{0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CmsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CmsError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CmsError::NotFound(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        CmsError::Remote(msg.into())
    }
}

impl From<reqwest::Error> for CmsError {
    fn from(err: reqwest::Error) -> Self {
        CmsError::Remote(format!("GitHub request failed: {}", err))
    }
}
