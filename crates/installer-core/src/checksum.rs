//! Checksum manifest parsing (`sha256sum` style output).

use std::collections::HashMap;

use installer_schema::{Sha256Digest, is_checksum_file};
use tracing::debug;

use crate::forges::RawAsset;

/// Digest per asset file name, built from a release's checksum manifest.
pub type ChecksumIndex = HashMap<String, Sha256Digest>;

/// Parse `"<digest> <filename>"` lines into an index.
///
/// A leading `*` on the filename (binary mode) is dropped. Lines without
/// exactly two fields, or whose digest is not SHA-256, are skipped.
pub fn parse_checksums(text: &str) -> ChecksumIndex {
    let mut index = ChecksumIndex::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        let (Some(digest), Some(file), None) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let file = file.strip_prefix('*').unwrap_or(file);
        match Sha256Digest::new(digest) {
            Ok(digest) => {
                index.insert(file.to_string(), digest);
            }
            Err(e) => debug!(%file, "skipping checksum line: {e}"),
        }
    }
    index
}

/// The first asset that looks like a checksum manifest.
pub fn find_manifest(assets: &[RawAsset]) -> Option<&RawAsset> {
    assets.iter().find(|a| is_checksum_file(&a.name, a.size))
}
