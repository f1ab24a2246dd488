//! Errors surfaced by release lookup and asset resolution.

use installer_schema::QueryError;
use thiserror::Error;

/// Result alias for resolver operations.
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;

/// Everything that can stop a query from resolving.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The repository or release does not exist upstream (HTTP 404).
    #[error("not found: url {url}")]
    NotFound {
        /// The URL that answered 404.
        url: String,
    },

    /// Any other non-success response from the release host.
    #[error("{status} {body}")]
    Upstream {
        /// Reason phrase, or the bare code when there is none.
        status: String,
        /// Response body as sent.
        body: String,
    },

    /// Transport failure before a response arrived.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body that is not the expected JSON.
    #[error("download failed: {url}: {source}")]
    Decode {
        /// Where the body came from.
        url: String,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The repository exists but has no release with this tag.
    #[error("release tag '{0}' not found")]
    ReleaseTagNotFound(String),

    /// The release has no files attached at all.
    #[error("no assets found")]
    NoAssets,

    /// Every file attached to the release was rejected.
    #[error("no downloads found for this release")]
    NoDownloads,

    /// The query itself is malformed.
    #[error("{0}")]
    InvalidQuery(#[from] QueryError),
}

impl ResolveError {
    /// Whether this is the 404 sentinel that may trigger the search fallback.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Build an [`ResolveError::Upstream`] from a status code and response body.
    pub fn upstream(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::Upstream {
            status: status
                .canonical_reason()
                .map_or_else(|| status.as_str().to_string(), str::to_string),
            body: body.into(),
        }
    }
}
