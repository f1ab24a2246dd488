//! Request and result types shared by the resolver and its renderers.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::FileType;
use crate::hash::Sha256Digest;
use crate::platform::{Arch, Os, Platform};

/// Release name that means "whatever the newest release is".
pub const LATEST: &str = "latest";

// `[/owner]/program[@release][!...]`
static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(/([\w\-]{1,128}))?",
        r"/([\w\-]{1,128})",
        r"(@([\w\-\.]{1,128}?))?",
        r"(!*)$",
    ))
    .unwrap_or_else(|e| panic!("invalid request path pattern: {e}"))
});

/// Errors produced while turning user input into a [`Query`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The path does not have the `[owner/]program[@release]` shape.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The program name is empty.
    #[error("Invalid path: program name is required")]
    MissingProgram,
}

/// A normalized install request.
///
/// Only `owner`, `program`, `release` and `select` influence which assets
/// are chosen; the remaining flags are consumed by transport or rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Repository owner. Empty means "use the configured default".
    pub owner: String,
    /// Program (repository) name.
    pub program: String,
    /// Release tag. Empty or `latest` means the newest release.
    pub release: String,
    /// Only consider assets whose name contains this substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    /// Install the binary under a different name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_program: Option<String>,
    /// Whether a web search may be used to guess the owner on a 404.
    pub search: bool,
    /// Skip TLS verification when downloading. Not used by resolution.
    pub insecure: bool,
    /// Move the installed binary onto `PATH`. Not used by resolution.
    pub move_to_path: bool,
}

impl Query {
    /// Build a query for `owner/program` at the latest release.
    pub fn new(owner: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            program: program.into(),
            release: LATEST.to_string(),
            ..Self::default()
        }
    }

    /// Pin the query to a release tag.
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = release.into();
        self
    }

    /// Restrict candidate assets to names containing `select`.
    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        let select = select.into();
        self.select = (!select.is_empty()).then_some(select);
        self
    }

    /// Allow or forbid the search fallback.
    pub fn with_search(mut self, search: bool) -> Self {
        self.search = search;
        self
    }

    /// Parse a request path such as `/astral-sh/uv@0.8.17!`.
    ///
    /// The leading slash is optional. Without an owner the query allows
    /// searching for one; without a release it targets `latest`; trailing
    /// `!` characters request moving the binary onto `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPath`] if the path does not match the
    /// grammar and [`QueryError::MissingProgram`] for an empty path.
    ///
    /// # Example
    ///
    /// ```
    /// use installer_schema::Query;
    ///
    /// let q = Query::from_path("gitleaks/gitleaks@v8.28.0!").unwrap();
    /// assert_eq!(q.owner, "gitleaks");
    /// assert_eq!(q.release, "v8.28.0");
    /// assert!(q.move_to_path);
    ///
    /// let q = Query::from_path("/micro").unwrap();
    /// assert_eq!(q.owner, "");
    /// assert!(q.search);
    /// ```
    pub fn from_path(path: &str) -> Result<Self, QueryError> {
        let trimmed = path.trim();
        if trimmed.trim_matches('/').is_empty() {
            return Err(QueryError::MissingProgram);
        }
        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };

        let caps = PATH_RE
            .captures(&normalized)
            .ok_or_else(|| QueryError::InvalidPath(path.to_string()))?;

        let owner = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let program = caps.get(3).map_or("", |m| m.as_str()).to_string();
        let release = caps
            .get(5)
            .map(|m| m.as_str())
            .filter(|r| !r.is_empty())
            .unwrap_or(LATEST)
            .to_string();
        let move_to_path = caps.get(6).is_some_and(|m| !m.as_str().is_empty());

        if program.is_empty() {
            return Err(QueryError::MissingProgram);
        }

        Ok(Self {
            search: owner.is_empty(),
            owner,
            program,
            release,
            move_to_path,
            ..Self::default()
        })
    }

    /// Whether the query targets the newest release rather than a fixed tag.
    pub fn wants_latest(&self) -> bool {
        self.release.is_empty() || self.release == LATEST
    }
}

/// One selected release file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name as published upstream.
    pub name: String,
    /// Target operating system.
    pub os: Os,
    /// Target CPU architecture.
    pub arch: Arch,
    /// Download URL.
    pub url: String,
    /// Container format.
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// SHA-256 from the release's checksum manifest, if one listed this file.
    #[serde(default)]
    pub sha256: Option<Sha256Digest>,
}

impl Asset {
    /// The asset's target platform.
    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }

    /// Platform key, `"<os>/<arch>"`.
    pub fn key(&self) -> String {
        self.platform().key()
    }

    /// Built for 32-bit x86.
    pub fn is_32bit(&self) -> bool {
        self.arch == Arch::I386
    }

    /// Built for macOS.
    pub fn is_mac(&self) -> bool {
        self.os == Os::Darwin
    }

    /// A native `darwin/arm64` build.
    pub fn is_apple_silicon(&self) -> bool {
        self.is_mac() && self.arch == Arch::Arm64
    }
}

/// Whether any asset is a native Apple Silicon build.
pub fn has_apple_silicon(assets: &[Asset]) -> bool {
    assets.iter().any(Asset::is_apple_silicon)
}

/// A successful resolution of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The query as finally resolved (owner/program may come from search).
    pub query: Query,
    /// Concrete release tag, never empty.
    pub resolved_release: String,
    /// When this result was produced.
    pub timestamp: DateTime<Utc>,
    /// One asset per platform, sorted by platform key.
    pub assets: Vec<Asset>,
    /// Whether `assets` contains a `darwin/arm64` build.
    pub apple_silicon: bool,
}

impl Resolution {
    /// Assemble a resolution, deriving the Apple Silicon flag.
    pub fn new(
        query: Query,
        resolved_release: impl Into<String>,
        timestamp: DateTime<Utc>,
        assets: Vec<Asset>,
    ) -> Self {
        let apple_silicon = has_apple_silicon(&assets);
        Self {
            query,
            resolved_release: resolved_release.into(),
            timestamp,
            assets,
            apple_silicon,
        }
    }

    /// Look up the selected asset for a platform key such as `linux/amd64`.
    pub fn asset_for(&self, key: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.key() == key)
    }
}
