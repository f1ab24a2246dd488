//! Release hosts that the fetcher can read from.

pub mod github;
pub mod traits;

pub use github::GitHubSource;
pub use traits::{RawAsset, ReleaseInfo, ReleasePage, ReleaseSource};
