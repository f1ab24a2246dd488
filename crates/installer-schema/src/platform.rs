//! Normalized operating system and CPU architecture tokens.
//!
//! Release filenames spell platforms dozens of ways (`macOS`, `osx`,
//! `aarch_64`, `x64`, ...). Everything downstream of the classifier works
//! with these canonical tokens, which use Go's `GOOS`/`GOARCH` spelling.

use serde::{Deserialize, Serialize};

/// Operating system a release asset targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// IBM AIX.
    Aix,
    /// Android.
    Android,
    /// macOS, whatever the filename called it (`darwin`, `mac`, `osx`).
    Darwin,
    /// DragonFly BSD.
    Dragonfly,
    /// FreeBSD.
    Freebsd,
    /// illumos.
    Illumos,
    /// iOS.
    Ios,
    /// Linux.
    Linux,
    /// NetBSD.
    Netbsd,
    /// OpenBSD.
    Openbsd,
    /// Plan 9.
    Plan9,
    /// Solaris.
    Solaris,
    /// Windows (`win`, `win32`, `win64`, `windows`).
    Windows,
}

impl Os {
    /// Canonical lowercase token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aix => "aix",
            Self::Android => "android",
            Self::Darwin => "darwin",
            Self::Dragonfly => "dragonfly",
            Self::Freebsd => "freebsd",
            Self::Illumos => "illumos",
            Self::Ios => "ios",
            Self::Linux => "linux",
            Self::Netbsd => "netbsd",
            Self::Openbsd => "openbsd",
            Self::Plan9 => "plan9",
            Self::Solaris => "solaris",
            Self::Windows => "windows",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aix" => Ok(Self::Aix),
            "android" => Ok(Self::Android),
            "darwin" | "mac" | "macos" | "osx" => Ok(Self::Darwin),
            "dragonfly" => Ok(Self::Dragonfly),
            "freebsd" => Ok(Self::Freebsd),
            "illumos" => Ok(Self::Illumos),
            "ios" => Ok(Self::Ios),
            "linux" => Ok(Self::Linux),
            "netbsd" => Ok(Self::Netbsd),
            "openbsd" => Ok(Self::Openbsd),
            "plan9" => Ok(Self::Plan9),
            "solaris" => Ok(Self::Solaris),
            "windows" | "win" => Ok(Self::Windows),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

/// CPU architecture a release asset targets.
///
/// # Example
///
/// ```
/// use installer_schema::Arch;
///
/// let arch: Arch = "aarch64".parse().unwrap();
/// assert_eq!(arch.as_str(), "arm64");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86 (`386`, `i686`, `x32`, `32bit`).
    #[serde(rename = "386")]
    I386,
    /// 64-bit x86 (`amd64`, `x86_64`, `x64`, `64bit`).
    #[serde(rename = "amd64")]
    Amd64,
    /// 32-bit ARM, any revision or float ABI.
    #[serde(rename = "arm")]
    Arm,
    /// 64-bit ARM (`arm64`, `aarch64`).
    #[serde(rename = "arm64")]
    Arm64,
    /// `LoongArch` 64-bit.
    #[serde(rename = "loong64")]
    Loong64,
    /// Big-endian MIPS.
    #[serde(rename = "mips")]
    Mips,
    /// Big-endian MIPS64.
    #[serde(rename = "mips64")]
    Mips64,
    /// Little-endian MIPS64.
    #[serde(rename = "mips64le")]
    Mips64le,
    /// Little-endian MIPS.
    #[serde(rename = "mipsle")]
    Mipsle,
    /// Big-endian `PowerPC` 64-bit.
    #[serde(rename = "ppc64")]
    Ppc64,
    /// Little-endian `PowerPC` 64-bit.
    #[serde(rename = "ppc64le")]
    Ppc64le,
    /// RISC-V 64-bit.
    #[serde(rename = "riscv64")]
    Riscv64,
    /// IBM Z.
    #[serde(rename = "s390x")]
    S390x,
    /// WebAssembly.
    #[serde(rename = "wasm")]
    Wasm,
}

impl Arch {
    /// Canonical token, as used in platform keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I386 => "386",
            Self::Amd64 => "amd64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Loong64 => "loong64",
            Self::Mips => "mips",
            Self::Mips64 => "mips64",
            Self::Mips64le => "mips64le",
            Self::Mipsle => "mipsle",
            Self::Ppc64 => "ppc64",
            Self::Ppc64le => "ppc64le",
            Self::Riscv64 => "riscv64",
            Self::S390x => "s390x",
            Self::Wasm => "wasm",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "386" | "i386" | "i686" | "x86" => Ok(Self::I386),
            "amd64" | "x86_64" | "x64" => Ok(Self::Amd64),
            "arm" => Ok(Self::Arm),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "loong64" | "loongarch64" => Ok(Self::Loong64),
            "mips" => Ok(Self::Mips),
            "mips64" => Ok(Self::Mips64),
            "mips64le" => Ok(Self::Mips64le),
            "mipsle" => Ok(Self::Mipsle),
            "ppc64" | "powerpc64" => Ok(Self::Ppc64),
            "ppc64le" | "powerpc64le" => Ok(Self::Ppc64le),
            "riscv64" => Ok(Self::Riscv64),
            "s390x" => Ok(Self::S390x),
            "wasm" => Ok(Self::Wasm),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// An `(OS, Arch)` pair identifying one install target.
///
/// Displays as the platform key `"<os>/<arch>"`. Ordering follows the key
/// string so that sorted asset lists are stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Pair an OS with an architecture.
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform key, e.g. `linux/amd64`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.os.as_str(), self.arch.as_str())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl PartialOrd for Platform {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Platform {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}
