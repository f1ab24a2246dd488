//! Shared types and filename classification for `installer`.
//!
//! Nothing in this crate performs I/O: it turns release filenames into
//! platform tokens and defines the request/result records that the resolver
//! in `installer-core` produces.

pub mod classify;
pub mod hash;
pub mod platform;
pub mod types;

// Re-exports
pub use classify::{
    AssetPattern, FileType, classify_arch, classify_os, file_extension, is_checksum_file,
};
pub use hash::Sha256Digest;
pub use platform::{Arch, Os, Platform};
pub use types::{Asset, LATEST, Query, QueryError, Resolution, has_apple_silicon};
