//! Validated SHA-256 digests.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// SHA-256 of a release asset, stored as 64 lowercase hex characters.
///
/// Digests read from upstream checksum manifests pass through here, so a
/// manifest line carrying a SHA-1 or SHA-512 value never ends up attached
/// to an asset as if it were SHA-256.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parse a hex digest, optionally prefixed with `sha256:`.
    ///
    /// # Errors
    ///
    /// Fails unless the value is exactly 64 hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let digits = s.strip_prefix("sha256:").unwrap_or(&s);
        ensure!(
            digits.len() == 64 && digits.bytes().all(|b| b.is_ascii_hexdigit()),
            "not a sha256 digest: '{s}'"
        );
        Ok(Self(digits.to_ascii_lowercase()))
    }

    /// The lowercase hex digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Sha256Digest> for String {
    fn from(digest: Sha256Digest) -> Self {
        digest.0
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
