//! Configuration module

mod github;
mod site;

pub use github::GithubConfig;
pub use site::SiteConfig;
