//! Run the post-editing API

use anyhow::Result;
use std::sync::Arc;

use crate::config::GithubConfig;
use crate::repository::PostRepository;
use crate::server::{self, AppState};
use crate::store::GithubStore;

/// Build the server state from store settings.
///
/// Bad settings are logged and the API keeps answering with a configuration
/// error instead of refusing to start.
pub fn build_state(config: crate::error::Result<GithubConfig>) -> Result<AppState> {
    let repository = match config {
        Ok(config) => {
            tracing::info!(
                "Using GitHub repository {}/{} on branch {}",
                config.owner,
                config.repo,
                config.branch
            );
            let store = GithubStore::new(config)?;
            Some(PostRepository::new(Arc::new(store)))
        }
        Err(e) => {
            tracing::error!("{}; every request will fail until it is fixed", e);
            None
        }
    };

    Ok(AppState::new(repository))
}

/// Start the API server
pub async fn run(
    config: crate::error::Result<GithubConfig>,
    ip: &str,
    port: u16,
    prefix: &str,
) -> Result<()> {
    let state = Arc::new(build_state(config)?);
    server::start(state, ip, port, prefix).await
}
