//! CLI entry point for blog-cms

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_cms::config::GithubConfig;

#[derive(Parser)]
#[command(name = "blog-cms")]
#[command(version)]
#[command(about = "A headless CMS for Markdown blogs stored in a GitHub repository", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the post-editing API
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8788")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "127.0.0.1")]
        ip: String,

        /// Path prefix for the API routes
        #[arg(long, default_value = blog_cms::server::DEFAULT_PREFIX)]
        prefix: String,

        /// Access token for the content repository
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Owner of the content repository
        #[arg(long, env = "GITHUB_OWNER")]
        owner: Option<String>,

        /// Name of the content repository
        #[arg(long, env = "GITHUB_REPO")]
        repo: Option<String>,

        /// Branch that receives commits (defaults to main)
        #[arg(long, env = "GITHUB_BRANCH")]
        branch: Option<String>,

        /// GitHub API base URL
        #[arg(long, env = "GITHUB_API_URL")]
        api_url: Option<String>,
    },

    /// Generate rss.xml and sitemap.xml
    #[command(alias = "g")]
    Generate,

    /// List published posts
    List,

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Slug for the new post (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,

        /// Mark the post as a draft
        #[arg(long)]
        draft: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "blog_cms=debug,info"
    } else {
        "blog_cms=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve {
            port,
            ip,
            prefix,
            token,
            owner,
            repo,
            branch,
            api_url,
        } => {
            let config = GithubConfig::from_parts(token, owner, repo, branch, api_url);
            blog_cms::commands::serve::run(config, &ip, port, &prefix).await?;
        }

        Commands::Generate => {
            let site = blog_cms::Site::new(&base_dir)?;
            tracing::info!("Generating feeds...");
            site.generate()?;
            println!("Generated successfully!");
        }

        Commands::List => {
            let site = blog_cms::Site::new(&base_dir)?;
            blog_cms::commands::list::run(&site)?;
        }

        Commands::New { title, slug, draft } => {
            let site = blog_cms::Site::new(&base_dir)?;
            let path = blog_cms::commands::new::create_post(&site, &title, slug.as_deref(), draft)?;
            println!("Created: {:?}", path);
        }
    }

    Ok(())
}
