//! Picks one release asset per platform from a noisy candidate list.
//!
//! Assets whose OS was recognised go into an exact bucket keyed by
//! `os/arch`. Assets with no OS (and Linux assets with no architecture) go
//! into an ambiguous bucket that is assumed to be Linux; those only fill
//! platform keys the exact bucket left empty.

use std::collections::{BTreeMap, HashMap};

use installer_schema::{
    Arch, Asset, FileType, Os, Platform, classify_arch, classify_os, file_extension,
};
use tracing::debug;

use crate::checksum::ChecksumIndex;
use crate::error::{ResolveError, Result};
use crate::forges::RawAsset;

/// Files with no extension above this size are taken to be bare binaries.
const MIN_BARE_BINARY_SIZE: u64 = 1024 * 1024;

struct Candidate<'a> {
    raw: &'a RawAsset,
    os: Option<Os>,
    arch: Arch,
    file_type: FileType,
}

impl Candidate<'_> {
    fn name(&self) -> &str {
        &self.raw.name
    }

    fn into_asset(self, os: Os, checksums: &ChecksumIndex) -> Asset {
        Asset {
            name: self.raw.name.clone(),
            os,
            arch: self.arch,
            url: self.raw.browser_download_url.clone(),
            file_type: self.file_type,
            sha256: checksums.get(&self.raw.name).cloned(),
        }
    }
}

/// Whether `new` should replace `old` on a platform-key collision.
///
/// Only a clear musl build beats a clear glibc build; anything else keeps
/// the asset seen first.
fn prefers_libc(new: &str, old: &str) -> bool {
    let gnu = |s: &str| s.contains("gnu");
    let musl = |s: &str| s.contains("musl");
    gnu(old) && !musl(old) && musl(new) && !gnu(new)
}

fn file_type_of(raw: &RawAsset) -> Option<FileType> {
    match file_extension(&raw.browser_download_url) {
        Some(ext) => FileType::from_extension(ext),
        None if raw.size > MIN_BARE_BINARY_SIZE => Some(FileType::Bin),
        None => None,
    }
}

/// Choose the installable assets of a release.
///
/// `select`, when set, keeps only assets whose name contains it. Digests
/// found in `checksums` are attached by exact file name. The result holds
/// one asset per platform key, sorted by key.
///
/// # Errors
///
/// [`ResolveError::NoAssets`] if `assets` is empty, and
/// [`ResolveError::NoDownloads`] if every asset was rejected.
pub fn select_assets(
    assets: &[RawAsset],
    select: Option<&str>,
    checksums: &ChecksumIndex,
) -> Result<Vec<Asset>> {
    if assets.is_empty() {
        return Err(ResolveError::NoAssets);
    }

    let mut exact: HashMap<Platform, Candidate<'_>> = HashMap::new();
    let mut ambiguous: HashMap<Arch, Candidate<'_>> = HashMap::new();

    for raw in assets {
        let Some(file_type) = file_type_of(raw) else {
            debug!(asset = %raw.name, "unsupported file type");
            continue;
        };
        let os = classify_os(&raw.name);
        let arch = classify_arch(&raw.name);
        if os == Some(Os::Windows) {
            debug!(asset = %raw.name, "windows not supported");
            continue;
        }
        if select.is_some_and(|s| !raw.name.contains(s)) {
            debug!(asset = %raw.name, ?select, "select excludes asset");
            continue;
        }

        let candidate = Candidate {
            raw,
            os,
            arch: arch.unwrap_or(Arch::Amd64),
            file_type,
        };

        match (os, arch) {
            (Some(os), _) if !(os == Os::Linux && arch.is_none()) => {
                let platform = Platform::new(os, candidate.arch);
                let keep_old = exact
                    .get(&platform)
                    .is_some_and(|old| !prefers_libc(candidate.name(), old.name()));
                if keep_old {
                    continue;
                }
                exact.insert(platform, candidate);
            }
            _ => {
                if let Some(old) = ambiguous.get(&candidate.arch) {
                    let old_linux = old.os == Some(Os::Linux);
                    let new_linux = candidate.os == Some(Os::Linux);
                    let keep_old = match (old_linux, new_linux) {
                        (true, false) => true,
                        (false, true) => false,
                        _ => !prefers_libc(candidate.name(), old.name()),
                    };
                    if keep_old {
                        continue;
                    }
                }
                ambiguous.insert(candidate.arch, candidate);
            }
        }
    }

    let mut index: BTreeMap<String, Asset> = exact
        .into_iter()
        .map(|(platform, c)| (platform.key(), c.into_asset(platform.os, checksums)))
        .collect();
    for (arch, candidate) in ambiguous {
        let key = Platform::new(Os::Linux, arch).key();
        if index.contains_key(&key) {
            debug!(asset = %candidate.name(), %key, "exact match already chosen");
            continue;
        }
        index.insert(key, candidate.into_asset(Os::Linux, checksums));
    }

    if index.is_empty() {
        return Err(ResolveError::NoDownloads);
    }
    Ok(index.into_values().collect())
}
