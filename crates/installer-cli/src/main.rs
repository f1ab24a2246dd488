//! installer CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use installer_cli::cmd;
use installer_cli::cmd::resolve::ResolveArgs;
use installer_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries the result
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolver_config();

    match cli.command {
        Commands::Resolve {
            path,
            select,
            as_program,
            no_search,
            insecure,
            format,
        } => {
            let args = ResolveArgs {
                path,
                select,
                as_program,
                no_search,
                insecure,
                format,
            };
            cmd::resolve::resolve(config, &args).await
        }
        Commands::Classify { names } => {
            cmd::classify::classify(&names);
            Ok(())
        }
    }
}
