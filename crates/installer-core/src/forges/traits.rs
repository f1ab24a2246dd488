//! The seam between the fetcher and a release-hosting API.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// A release as reported by the hosting API.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    /// Tag the release was published under.
    pub tag_name: String,
    /// Attached files; may be empty in listings.
    #[serde(default)]
    pub assets: Vec<RawAsset>,
    /// Where to list the assets if `assets` came back empty.
    #[serde(default)]
    pub assets_url: String,
}

/// A file attached to a release. Never leaves the fetch/select boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAsset {
    /// File name as uploaded.
    pub name: String,
    /// Public download URL.
    pub browser_download_url: String,
    /// Size in bytes, zero when unknown.
    #[serde(default)]
    pub size: u64,
}

/// One page of a release listing.
#[derive(Debug, Clone, Default)]
pub struct ReleasePage {
    /// Releases on this page, newest first.
    pub releases: Vec<ReleaseInfo>,
    /// Whether the host advertised a further page.
    pub has_next: bool,
}

/// A remote release host (e.g. GitHub) that the fetcher talks to.
///
/// A missing repository or release must surface as
/// [`ResolveError::NotFound`](crate::error::ResolveError::NotFound) so the
/// resolver can decide whether to fall back to search.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// The newest non-draft release of `owner/repo`.
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo>;

    /// Page `page` (1-based) of the releases of `owner/repo`.
    async fn list_releases(&self, owner: &str, repo: &str, page: u32) -> Result<ReleasePage>;

    /// The assets listed at a release's `assets_url`.
    async fn release_assets(&self, assets_url: &str) -> Result<Vec<RawAsset>>;

    /// Plain-text body of a URL, used for checksum manifests.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}
