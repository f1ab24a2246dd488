//! Resolve command

use anyhow::{Result, bail};
use installer_core::{Resolver, ResolverConfig};
use installer_schema::Query;
use tracing::debug;

use crate::Format;
use crate::render::{render, sanitize_error};

#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    pub path: String,
    pub select: Option<String>,
    pub as_program: Option<String>,
    pub no_search: bool,
    pub insecure: bool,
    pub format: Format,
}

/// Build the query a `resolve` invocation asks for.
pub fn build_query(args: &ResolveArgs) -> Result<Query> {
    let mut query = match Query::from_path(&args.path) {
        Ok(query) => query,
        Err(e) => bail!(sanitize_error(&e.to_string())),
    };
    if let Some(select) = &args.select {
        query = query.with_select(select.as_str());
    }
    query.as_program = args.as_program.clone().filter(|s| !s.is_empty());
    if args.no_search {
        query.search = false;
    }
    query.insecure = args.insecure;
    Ok(query)
}

pub async fn resolve(config: ResolverConfig, args: &ResolveArgs) -> Result<()> {
    let query = build_query(args)?;
    debug!(?query, "resolving");

    let resolver = Resolver::new(config)?;
    let resolution = match resolver.resolve(query).await {
        Ok(resolution) => resolution,
        Err(e) => bail!(sanitize_error(&e.to_string())),
    };

    print!("{}", render(&resolution, args.format)?);
    if args.format == Format::Json {
        println!();
    }
    Ok(())
}
