//! Release filename classification.
//!
//! Upstream projects name their release files with no common convention:
//! `uv-x86_64-unknown-linux-musl.tar.gz`, `gitleaks_8.28.0_linux_x32.tar.gz`,
//! `croc_v10.2.1_macOS-ARM64.tar.gz`, `libtree_armv6l`. The functions here
//! map such names onto [`Os`], [`Arch`] and [`FileType`] tokens.
//!
//! The regex engine has no look-around, and `\b` treats `_` as a word
//! character, so token boundaries are spelled out as `(?:[^a-z0-9]|^)` and
//! `(?:[^a-z0-9]|$)`. All matching happens on the lowercased name.
//!
//! Rules are tried in a fixed order and the first hit wins. Several tokens
//! are substrings of others (`ppc64` / `ppc64le`, `arm` / `arm64`,
//! `x86` / `x86_64`), so the order is significant.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::platform::{Arch, Os};

/// Checksum manifests larger than this are assumed to be real binaries.
pub const MAX_CHECKSUM_FILE_SIZE: u64 = 64 * 1024;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid classifier pattern {pattern}: {e}"))
}

// OS patterns are prefix matches so that `macos` and `win64` hit `mac` / `win`.
static OS_DARWIN: LazyLock<Regex> = LazyLock::new(|| re(r"(?:[^a-z0-9]|^)(darwin|mac|osx)"));
static OS_DRAGONFLY: LazyLock<Regex> = LazyLock::new(|| re(r"(?:[^a-z0-9]|^)(dragonfly)"));
static OS_WINDOWS: LazyLock<Regex> = LazyLock::new(|| re(r"(?:[^a-z0-9]|^)(win)"));
static OS_MISC: LazyLock<Regex> = LazyLock::new(|| {
    re(concat!(
        r"(?:[^a-z0-9]|^)",
        r"(aix|android|illumos|ios|linux|(?:free|net|open)bsd|plan9|solaris)",
        r"(?:[^a-z0-9]|$)",
    ))
});

// Architecture patterns are suffix matches so that `i686` hits `686`.
static ARCH_LOONG64: LazyLock<Regex> =
    LazyLock::new(|| re(r"(loong64|loongarch64)(?:[^a-z0-9]|$)"));
static ARCH_PPC64: LazyLock<Regex> = LazyLock::new(|| re(r"(ppc64|powerpc64)(?:[^a-z0-9]|$)"));
static ARCH_PPC64LE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(ppc64le|powerpc64le|ppcle_64)(?:[^a-z0-9]|$)"));
static ARCH_RISCV64: LazyLock<Regex> = LazyLock::new(|| re(r"riscv64"));
static ARCH_ARM64: LazyLock<Regex> =
    LazyLock::new(|| re(r"(arm64|aarch64|aarch_64)(?:[^a-z0-9]|$)"));
static ARCH_AMD64: LazyLock<Regex> = LazyLock::new(|| re(r"(amd64|x86_64)(?:[^a-z0-9]|$)"));
// Bounded on the left as well, otherwise `marmite` and `farm` would be ARM.
static ARCH_ARM: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?:[^a-z0-9]|^)(arm(?:v[5-7]|32)?[eh]?[fl]?)(?:[^a-z0-9]|$)"));
static ARCH_386: LazyLock<Regex> = LazyLock::new(|| re(r"(386|686|x86_32)(?:[^a-z0-9]|$)"));
static ARCH_MISC: LazyLock<Regex> = LazyLock::new(|| {
    re(concat!(
        r"(?:[^a-z0-9]|^)",
        r"(mips64le|mips64|mipsle|mips|s390x|s390_64|wasm)",
        r"(?:[^a-z0-9]|$)",
    ))
});
static FUZZY_AMD64: LazyLock<Regex> = LazyLock::new(|| re(r"(x?64(?:bit)?)\b"));
static FUZZY_386: LazyLock<Regex> = LazyLock::new(|| re(r"(x?32(?:bit)?|x86)\b"));

static FILE_EXT: LazyLock<Regex> = LazyLock::new(|| re(r"(\.tar)?(\.[a-z][a-z0-9]+)$"));
static CHECKSUM_NAME: LazyLock<Regex> = LazyLock::new(|| re(r"(checksums|sha256sums)"));

/// Detect the operating system named in a release filename.
///
/// Returns `None` when no token matches. That is a meaningful answer: the
/// selector treats such assets as "probably Linux" candidates of last resort.
///
/// # Example
///
/// ```
/// use installer_schema::{Os, classify_os};
///
/// assert_eq!(classify_os("croc_v10.2.1_macOS-ARM64.tar.gz"), Some(Os::Darwin));
/// assert_eq!(classify_os("yt-dlp"), None);
/// ```
pub fn classify_os(filename: &str) -> Option<Os> {
    let name = filename.to_lowercase();

    if OS_DARWIN.is_match(&name) {
        return Some(Os::Darwin);
    }
    if OS_DRAGONFLY.is_match(&name) {
        return Some(Os::Dragonfly);
    }
    if OS_WINDOWS.is_match(&name) {
        return Some(Os::Windows);
    }
    let caps = OS_MISC.captures(&name)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Detect the CPU architecture named in a release filename.
///
/// # Example
///
/// ```
/// use installer_schema::{Arch, classify_arch};
///
/// assert_eq!(classify_arch("gitleaks_8.28.0_linux_x32.tar.gz"), Some(Arch::I386));
/// assert_eq!(classify_arch("runc.armel"), Some(Arch::Arm));
/// ```
pub fn classify_arch(filename: &str) -> Option<Arch> {
    let name = filename.to_lowercase();

    let ordered: [(&LazyLock<Regex>, Arch); 8] = [
        (&ARCH_LOONG64, Arch::Loong64),
        (&ARCH_PPC64, Arch::Ppc64),
        (&ARCH_PPC64LE, Arch::Ppc64le),
        (&ARCH_RISCV64, Arch::Riscv64),
        (&ARCH_ARM64, Arch::Arm64),
        (&ARCH_AMD64, Arch::Amd64),
        (&ARCH_ARM, Arch::Arm),
        (&ARCH_386, Arch::I386),
    ];
    for (pattern, arch) in ordered {
        if pattern.is_match(&name) {
            return Some(arch);
        }
    }

    if let Some(caps) = ARCH_MISC.captures(&name) {
        let arch = match caps.get(1).map(|m| m.as_str()) {
            Some("mips64le") => Arch::Mips64le,
            Some("mips64") => Arch::Mips64,
            Some("mipsle") => Arch::Mipsle,
            Some("mips") => Arch::Mips,
            Some("s390x" | "s390_64") => Arch::S390x,
            _ => Arch::Wasm,
        };
        return Some(arch);
    }

    if FUZZY_AMD64.is_match(&name) {
        return Some(Arch::Amd64);
    }
    if FUZZY_386.is_match(&name) {
        return Some(Arch::I386);
    }
    None
}

/// Extract the trailing extension of a URL or filename.
///
/// A `.tar` directly before the last extension is kept with it, so
/// `foo.tar.gz` yields `.tar.gz` rather than `.gz`. Returns `None` if the
/// name has no dotted suffix.
pub fn file_extension(url_or_name: &str) -> Option<&str> {
    FILE_EXT.find(url_or_name).map(|m| m.as_str())
}

/// Whether a release asset looks like a published checksum manifest.
pub fn is_checksum_file(filename: &str, size: u64) -> bool {
    CHECKSUM_NAME.is_match(&filename.to_lowercase()) && size < MAX_CHECKSUM_FILE_SIZE
}

/// Downloadable container formats an install script knows how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// A bare executable with no extension.
    #[serde(rename = ".bin")]
    Bin,
    /// Zip archive.
    #[serde(rename = ".zip")]
    Zip,
    /// Bzip tarball (`.tar.bz`).
    #[serde(rename = ".tar.bz")]
    TarBz,
    /// Bzip2 tarball (`.tar.bz2`).
    #[serde(rename = ".tar.bz2")]
    TarBz2,
    /// Bzip2-compressed single file.
    #[serde(rename = ".bz2")]
    Bz2,
    /// Gzip-compressed single file.
    #[serde(rename = ".gz")]
    Gz,
    /// Gzip tarball (`.tar.gz`).
    #[serde(rename = ".tar.gz")]
    TarGz,
    /// Gzip tarball (`.tgz`).
    #[serde(rename = ".tgz")]
    Tgz,
}

impl FileType {
    /// The extension string, including the leading dot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bin => ".bin",
            Self::Zip => ".zip",
            Self::TarBz => ".tar.bz",
            Self::TarBz2 => ".tar.bz2",
            Self::Bz2 => ".bz2",
            Self::Gz => ".gz",
            Self::TarGz => ".tar.gz",
            Self::Tgz => ".tgz",
        }
    }

    /// Map an extension produced by [`file_extension`] to a supported type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".bin" => Some(Self::Bin),
            ".zip" => Some(Self::Zip),
            ".tar.bz" => Some(Self::TarBz),
            ".tar.bz2" => Some(Self::TarBz2),
            ".bz2" => Some(Self::Bz2),
            ".gz" => Some(Self::Gz),
            ".tar.gz" => Some(Self::TarGz),
            ".tgz" => Some(Self::Tgz),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed representation of an asset filename's platform indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetPattern {
    /// Detected operating system, if any token was found.
    pub os: Option<Os>,
    /// Detected CPU architecture, if any token was found.
    pub arch: Option<Arch>,
}

impl AssetPattern {
    /// Classify both OS and architecture of a filename.
    pub fn from_filename(filename: &str) -> Self {
        Self {
            os: classify_os(filename),
            arch: classify_arch(filename),
        }
    }
}
