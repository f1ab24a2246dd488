//! Resolver settings and built-in defaults.

use std::time::Duration;

/// Owner used when a request names only a program.
pub const DEFAULT_OWNER: &str = "jpillora";

/// GitHub REST API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// How long a successful resolution is served from cache.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Programs whose owner is known even when the request omits it.
const OWNER_OVERRIDES: &[(&str, &str)] = &[
    // micro > nano!
    ("micro", "zyedidia"),
];

/// Settings for a [`Resolver`](crate::resolver::Resolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Owner assumed for bare program names.
    pub default_owner: String,
    /// GitHub token sent as a bearer credential.
    pub token: Option<String>,
    /// Base URL of the release-hosting API.
    pub api_url: String,
    /// Cache lifetime; zero disables caching.
    pub cache_ttl: Duration,
    /// Always use this owner, whatever the request says.
    pub force_owner: Option<String>,
    /// Always use this repository, whatever the request says.
    pub force_repo: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_owner: DEFAULT_OWNER.to_string(),
            token: None,
            api_url: GITHUB_API_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            force_owner: None,
            force_repo: None,
        }
    }
}

/// Built-in owner for a program name, if there is one.
pub fn owner_override(program: &str) -> Option<&'static str> {
    OWNER_OVERRIDES
        .iter()
        .find(|(p, _)| *p == program)
        .map(|(_, owner)| *owner)
}
