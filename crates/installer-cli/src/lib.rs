//! installer - turn `owner/program@release` into per-platform downloads
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Looks up a GitHub release, picks one asset per OS/architecture from
//! whatever naming scheme the project uses, and prints the result as text
//! or JSON.

pub mod cmd;
pub mod render;

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use installer_core::ResolverConfig;
use installer_core::config::{DEFAULT_OWNER, GITHUB_API_URL};

#[derive(Debug, Parser)]
#[command(name = "installer")]
#[command(author, version, about = "Resolve GitHub releases to per-platform downloads")]
pub struct Cli {
    /// Owner assumed when a path names only a program
    #[arg(long = "user", env = "INSTALLER_USER", global = true, default_value = DEFAULT_OWNER)]
    pub default_owner: String,

    /// GitHub token, raises the API rate limit
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Release API root
    #[arg(long, env = "GITHUB_API_URL", global = true, default_value = GITHUB_API_URL)]
    pub api_url: String,

    /// Seconds a result stays cached (0 disables)
    #[arg(long, env = "INSTALLER_CACHE_TTL", global = true, default_value_t = 3600)]
    pub cache_ttl: u64,

    /// Always use this owner
    #[arg(long = "force-user", env = "INSTALLER_FORCE_USER", global = true)]
    pub force_owner: Option<String>,

    /// Always use this repository
    #[arg(long, env = "INSTALLER_FORCE_REPO", global = true)]
    pub force_repo: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Resolver settings from flags and environment.
    pub fn resolver_config(&self) -> ResolverConfig {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        ResolverConfig {
            default_owner: self.default_owner.clone(),
            token: non_empty(&self.token),
            api_url: self.api_url.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            force_owner: non_empty(&self.force_owner),
            force_repo: non_empty(&self.force_repo),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human readable summary
    #[default]
    Text,
    /// The full resolution as JSON
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve a release to one download per platform
    Resolve {
        /// [owner/]program[@release][!]
        path: String,
        /// Only consider assets whose name contains this
        #[arg(long)]
        select: Option<String>,
        /// Install the binary under this name
        #[arg(long = "as")]
        as_program: Option<String>,
        /// Never guess the owner through web search
        #[arg(long)]
        no_search: bool,
        /// Mark the downloads as fetched without TLS verification
        #[arg(long)]
        insecure: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Show how release file names are classified (offline)
    Classify {
        /// Release asset file names
        #[arg(required = true)]
        names: Vec<String>,
    },
}
