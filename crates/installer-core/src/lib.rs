//! Release lookup, asset selection and caching for `installer`.
//!
//! [`Resolver`] is the entry point: it turns a [`Query`](installer_schema::Query)
//! into a [`Resolution`](installer_schema::Resolution) listing one download
//! per platform.

pub mod cache;
pub mod checksum;
pub mod config;
pub mod error;
pub mod fetch;
pub mod forges;
pub mod resolver;
pub mod search;
pub mod select;

pub use cache::ResultCache;
pub use config::ResolverConfig;
pub use error::{ResolveError, Result};
pub use resolver::Resolver;

/// User agent sent to the release-hosting API.
pub const USER_AGENT: &str = concat!("installer/", env!("CARGO_PKG_VERSION"));
