//! Release lookup: turns `(owner, repo, release)` into a tag and its files.

use installer_schema::LATEST;
use tracing::{debug, info, warn};

use crate::checksum::{ChecksumIndex, find_manifest, parse_checksums};
use crate::error::{ResolveError, Result};
use crate::forges::{RawAsset, ReleaseInfo, ReleaseSource};

/// A release as fetched, before asset selection.
#[derive(Debug, Clone)]
pub struct FetchedRelease {
    /// Concrete tag; for `latest` requests this is the tag upstream reported.
    pub tag: String,
    /// Every file attached to the release.
    pub assets: Vec<RawAsset>,
    /// Empty when the release has no manifest or it could not be read.
    pub checksums: ChecksumIndex,
}

/// Walk the release listing page by page until `tag` turns up.
async fn find_tagged(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
    tag: &str,
) -> Result<ReleaseInfo> {
    let mut page = 1;
    loop {
        let listing = source.list_releases(owner, repo, page).await?;
        debug!(%owner, %repo, page, releases = listing.releases.len(), "scanning releases");
        if let Some(found) = listing.releases.into_iter().find(|r| r.tag_name == tag) {
            return Ok(found);
        }
        if !listing.has_next {
            return Err(ResolveError::ReleaseTagNotFound(tag.to_string()));
        }
        page += 1;
    }
}

/// Look up a release and its checksum manifest.
///
/// An empty `release` or `latest` asks for the newest release. Any other
/// value must equal a tag exactly.
///
/// # Errors
///
/// [`ResolveError::NotFound`] if the repository (or latest release) does
/// not exist, [`ResolveError::ReleaseTagNotFound`] if no release carries the
/// requested tag on any page of the listing, and any transport error from `source`. A manifest that
/// cannot be read is logged and ignored.
pub async fn fetch_release(
    source: &dyn ReleaseSource,
    owner: &str,
    repo: &str,
    release: &str,
) -> Result<FetchedRelease> {
    let (tag, assets) = if release.is_empty() || release == LATEST {
        let latest = source.latest_release(owner, repo).await?;
        info!(%owner, %repo, tag = %latest.tag_name, "detected latest release");
        (latest.tag_name, latest.assets)
    } else {
        let found = find_tagged(source, owner, repo, release).await?;
        let assets = if found.assets.is_empty() && !found.assets_url.is_empty() {
            source.release_assets(&found.assets_url).await?
        } else {
            found.assets
        };
        (found.tag_name, assets)
    };

    let checksums = match find_manifest(&assets) {
        Some(manifest) => match source.fetch_text(&manifest.browser_download_url).await {
            Ok(text) => {
                let index = parse_checksums(&text);
                info!(manifest = %manifest.name, entries = index.len(), "loaded checksums");
                index
            }
            Err(e) => {
                warn!(manifest = %manifest.name, "failed to fetch checksums: {e}");
                ChecksumIndex::new()
            }
        },
        None => ChecksumIndex::new(),
    };

    Ok(FetchedRelease {
        tag,
        assets,
        checksums,
    })
}
