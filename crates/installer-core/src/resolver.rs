//! Request-level orchestration: cache, fetch, search fallback, select.

use std::sync::Arc;

use chrono::Utc;
use installer_schema::{Query, QueryError, Resolution};
use tracing::{info, warn};

use crate::cache::{ResultCache, cache_key};
use crate::config::{ResolverConfig, owner_override};
use crate::error::Result;
use crate::fetch::fetch_release;
use crate::forges::{GitHubSource, ReleaseSource};
use crate::search::{RepoSearch, WebSearch};
use crate::select::select_assets;

/// Resolves install queries to concrete release assets.
///
/// Owns its [`ResultCache`]; share one `Resolver` (e.g. behind an `Arc`)
/// between concurrent callers to share the cache.
pub struct Resolver {
    config: ResolverConfig,
    source: Arc<dyn ReleaseSource>,
    search: Arc<dyn RepoSearch>,
    cache: ResultCache,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// A resolver backed by the GitHub API and public web search.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let source = GitHubSource::new(&config)?;
        let search = WebSearch::new()?;
        Ok(Self::with_parts(config, Arc::new(source), Arc::new(search)))
    }

    /// A resolver over explicit release and search backends.
    pub fn with_parts(
        config: ResolverConfig,
        source: Arc<dyn ReleaseSource>,
        search: Arc<dyn RepoSearch>,
    ) -> Self {
        let cache = ResultCache::new(config.cache_ttl);
        Self {
            config,
            source,
            search,
            cache,
        }
    }

    /// Settings this resolver was built with.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The result cache shared by all calls to [`Resolver::resolve`].
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Resolve `query`, serving a cached result when one is fresh.
    ///
    /// The cache key is taken from the query as given, before the owner is
    /// filled in or replaced by search.
    ///
    /// # Errors
    ///
    /// [`ResolveError::InvalidQuery`](crate::ResolveError::InvalidQuery) for
    /// an empty program, otherwise whatever the fetch or selection step
    /// reports. A failed search fallback reports the original not-found.
    pub async fn resolve(&self, query: Query) -> Result<Resolution> {
        if query.program.is_empty() {
            return Err(QueryError::MissingProgram.into());
        }
        let key = cache_key(&query);
        let request = query.clone();
        let resolution = self
            .cache
            .get_or_try_insert_with(&key, || self.execute(query))
            .await?;
        Ok(with_request_flags(resolution, &request))
    }

    fn apply_owner(&self, query: &mut Query) {
        if query.owner.is_empty() {
            query.owner = match owner_override(&query.program) {
                Some(owner) => owner.to_string(),
                None => self.config.default_owner.clone(),
            };
        }
        if let Some(owner) = &self.config.force_owner {
            query.owner.clone_from(owner);
        }
        if let Some(repo) = &self.config.force_repo {
            query.program.clone_from(repo);
        }
    }

    async fn execute(&self, mut query: Query) -> Result<Resolution> {
        self.apply_owner(&mut query);
        let source = self.source.as_ref();

        let fetched =
            match fetch_release(source, &query.owner, &query.program, &query.release).await {
                Ok(fetched) => {
                    query.search = false;
                    fetched
                }
                Err(e) if e.is_not_found() && query.search => {
                    let found = match self.search.find_repo(&query.program).await {
                        Ok(found) => found,
                        Err(search_err) => {
                            warn!(program = %query.program, "search fallback failed: {search_err}");
                            return Err(e);
                        }
                    };
                    info!(
                        "{}/{} not found, retrying as {}/{}",
                        query.owner, query.program, found.owner, found.repo
                    );
                    query.owner = found.owner;
                    query.program = found.repo;
                    query.search = false;
                    fetch_release(source, &query.owner, &query.program, &query.release).await?
                }
                Err(e) => return Err(e),
            };

        let assets = select_assets(&fetched.assets, query.select.as_deref(), &fetched.checksums)?;
        info!(
            "resolved {}/{}@{} with {} assets",
            query.owner,
            query.program,
            fetched.tag,
            assets.len()
        );
        Ok(Resolution::new(query, fetched.tag, Utc::now(), assets))
    }
}

/// Carry the caller's rendering flags onto a possibly shared resolution.
///
/// Cache entries are keyed on the fields that pick assets, so the flags
/// stored with an entry belong to whoever resolved it first.
fn with_request_flags(mut resolution: Resolution, request: &Query) -> Resolution {
    resolution.query.as_program.clone_from(&request.as_program);
    resolution.query.insecure = request.insecure;
    resolution.query.move_to_path = request.move_to_path;
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::forges::{RawAsset, ReleaseInfo, ReleasePage};
    use crate::search::{RepoMatch, SearchError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSource {
        releases: HashMap<String, ReleaseInfo>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, owner: &str, repo: &str, tag: &str, names: &[&str]) -> Self {
            let assets = names
                .iter()
                .map(|n| RawAsset {
                    name: (*n).to_string(),
                    browser_download_url: format!(
                        "https://github.com/{owner}/{repo}/releases/download/{tag}/{n}"
                    ),
                    size: 3 * 1024 * 1024,
                })
                .collect();
            self.releases.insert(
                format!("{owner}/{repo}"),
                ReleaseInfo {
                    tag_name: tag.to_string(),
                    assets,
                    assets_url: String::new(),
                },
            );
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn not_found(what: &str) -> ResolveError {
        ResolveError::NotFound {
            url: format!("https://api.github.com/repos/{what}"),
        }
    }

    #[async_trait]
    impl ReleaseSource for FakeSource {
        async fn latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let id = format!("{owner}/{repo}");
            self.releases.get(&id).cloned().ok_or_else(|| not_found(&id))
        }

        async fn list_releases(&self, owner: &str, repo: &str, _page: u32) -> Result<ReleasePage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = format!("{owner}/{repo}");
            let release = self.releases.get(&id).cloned().ok_or_else(|| not_found(&id))?;
            Ok(ReleasePage {
                releases: vec![release],
                has_next: false,
            })
        }

        async fn release_assets(&self, url: &str) -> Result<Vec<RawAsset>> {
            Err(not_found(url))
        }

        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(not_found(url))
        }
    }

    #[derive(Default)]
    struct FakeSearch {
        answer: Option<(&'static str, &'static str)>,
        calls: AtomicUsize,
    }

    impl FakeSearch {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepoSearch for FakeSearch {
        async fn find_repo(&self, _program: &str) -> std::result::Result<RepoMatch, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .map(|(owner, repo)| RepoMatch {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
                .ok_or(SearchError::Exhausted)
        }
    }

    const UV: &[&str] = &[
        "uv-aarch64-apple-darwin.tar.gz",
        "uv-aarch64-pc-windows-msvc.zip",
        "uv-aarch64-unknown-linux-gnu.tar.gz",
        "uv-aarch64-unknown-linux-musl.tar.gz",
        "uv-loongarch64-unknown-linux-gnu.tar.gz",
        "uv-x86_64-apple-darwin.tar.gz",
        "uv-x86_64-pc-windows-msvc.zip",
        "uv-x86_64-unknown-linux-gnu.tar.gz",
        "uv-x86_64-unknown-linux-musl.tar.gz",
    ];

    const GITLEAKS: &[&str] = &[
        "gitleaks_8.28.0_darwin_arm64.tar.gz",
        "gitleaks_8.28.0_linux_armv6.tar.gz",
        "gitleaks_8.28.0_linux_x32.tar.gz",
        "gitleaks_8.28.0_linux_x64.tar.gz",
    ];

    fn setup(
        source: FakeSource,
        search: FakeSearch,
        ttl: Duration,
    ) -> (Resolver, Arc<FakeSource>, Arc<FakeSearch>) {
        let source = Arc::new(source);
        let search = Arc::new(search);
        let config = ResolverConfig {
            cache_ttl: ttl,
            ..ResolverConfig::default()
        };
        let resolver = Resolver::with_parts(config, source.clone(), search.clone());
        (resolver, source, search)
    }

    fn asset_name<'a>(resolution: &'a Resolution, key: &str) -> Option<&'a str> {
        resolution.asset_for(key).map(|a| a.name.as_str())
    }

    #[tokio::test]
    async fn test_resolve_uv_tag() {
        let source = FakeSource::default().with("astral-sh", "uv", "0.8.17", UV);
        let (resolver, _, _) = setup(source, FakeSearch::default(), Duration::from_secs(60));

        let res = resolver
            .resolve(Query::new("astral-sh", "uv").with_release("0.8.17"))
            .await
            .unwrap();

        assert_eq!(res.resolved_release, "0.8.17");
        assert_eq!(
            asset_name(&res, "linux/amd64"),
            Some("uv-x86_64-unknown-linux-musl.tar.gz")
        );
        assert_eq!(
            asset_name(&res, "linux/loong64"),
            Some("uv-loongarch64-unknown-linux-gnu.tar.gz")
        );
        assert_eq!(
            asset_name(&res, "darwin/arm64"),
            Some("uv-aarch64-apple-darwin.tar.gz")
        );
        assert!(res.assets.iter().all(|a| !a.key().starts_with("windows/")));
        assert!(res.apple_silicon);
        let keys: Vec<_> = res.assets.iter().map(|a| a.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[tokio::test]
    async fn test_resolve_gitleaks_latest() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let (resolver, _, _) = setup(source, FakeSearch::default(), Duration::from_secs(60));

        let res = resolver
            .resolve(Query::from_path("gitleaks/gitleaks").unwrap())
            .await
            .unwrap();
        assert_eq!(res.resolved_release, "v8.28.0");
        assert_eq!(
            asset_name(&res, "linux/386"),
            Some("gitleaks_8.28.0_linux_x32.tar.gz")
        );
        assert_eq!(
            asset_name(&res, "linux/arm"),
            Some("gitleaks_8.28.0_linux_armv6.tar.gz")
        );
    }

    #[tokio::test]
    async fn test_cache_hit_keeps_timestamp() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let (resolver, source, _) = setup(source, FakeSearch::default(), Duration::from_secs(60));
        let query = Query::new("gitleaks", "gitleaks");

        let first = resolver.resolve(query.clone()).await.unwrap();
        let second = resolver.resolve(query).await.unwrap();

        assert_eq!(first.timestamp, second.timestamp);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_uses_callers_flags() {
        let source = FakeSource::default().with("o", "t", "v1", GITLEAKS);
        let (resolver, source, _) = setup(source, FakeSearch::default(), Duration::from_secs(60));

        let mut renamed = Query::from_path("o/t!").unwrap();
        renamed.as_program = Some("renamed".into());
        renamed.insecure = true;
        let first = resolver.resolve(renamed).await.unwrap();
        assert!(first.query.move_to_path);
        assert_eq!(first.query.as_program.as_deref(), Some("renamed"));

        let second = resolver.resolve(Query::from_path("o/t").unwrap()).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(second.timestamp, first.timestamp);
        assert!(!second.query.move_to_path);
        assert!(!second.query.insecure);
        assert_eq!(second.query.as_program, None);
        assert_eq!(second.query.owner, "o");

        let third = resolver.resolve(Query::from_path("o/t!!").unwrap()).await.unwrap();
        assert!(third.query.move_to_path);
    }

    #[tokio::test]
    async fn test_direct_hit_clears_search() {
        let source = FakeSource::default().with("jpillora", "serve", "1.9.8", &["serve_linux_amd64.gz"]);
        let (resolver, _, search) = setup(source, FakeSearch::default(), Duration::from_secs(60));

        let query = Query::from_path("serve").unwrap();
        assert!(query.search);
        let res = resolver.resolve(query).await.unwrap();
        assert!(!res.query.search);
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_release_shares_latest_entry() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let (resolver, source, _) = setup(source, FakeSearch::default(), Duration::from_secs(60));

        resolver.resolve(Query::new("gitleaks", "gitleaks")).await.unwrap();
        resolver
            .resolve(Query::new("gitleaks", "gitleaks").with_release(""))
            .await
            .unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let (resolver, source, _) = setup(source, FakeSearch::default(), Duration::from_millis(40));
        let query = Query::new("gitleaks", "gitleaks");

        let first = resolver.resolve(query.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        let second = resolver.resolve(query).await.unwrap();

        assert!(second.timestamp > first.timestamp);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let (resolver, source, _) = setup(source, FakeSearch::default(), Duration::ZERO);
        let query = Query::new("gitleaks", "gitleaks");

        resolver.resolve(query.clone()).await.unwrap();
        resolver.resolve(query).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_micro_uses_builtin_owner_without_search() {
        let source = FakeSource::default().with(
            "zyedidia",
            "micro",
            "v2.0.14",
            &["micro-2.0.14-linux64.tar.gz", "micro-2.0.14-macos-arm64.tar.gz"],
        );
        let (resolver, _, search) = setup(source, FakeSearch::default(), Duration::from_secs(60));

        let res = resolver
            .resolve(Query::from_path("micro").unwrap())
            .await
            .unwrap();
        assert_eq!(res.query.owner, "zyedidia");
        assert_eq!(
            asset_name(&res, "linux/amd64"),
            Some("micro-2.0.14-linux64.tar.gz")
        );
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_fallback_once() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let search = FakeSearch {
            answer: Some(("gitleaks", "gitleaks")),
            ..FakeSearch::default()
        };
        let (resolver, source, search) = setup(source, search, Duration::from_secs(60));

        let res = resolver
            .resolve(Query::from_path("gitleaks").unwrap())
            .await
            .unwrap();
        assert_eq!(search.calls(), 1);
        assert_eq!(source.calls(), 2);
        assert_eq!(res.query.owner, "gitleaks");
        assert!(!res.query.search);
    }

    #[tokio::test]
    async fn test_search_failure_reports_original_not_found() {
        let (resolver, source, search) =
            setup(FakeSource::default(), FakeSearch::default(), Duration::from_secs(60));

        let err = resolver
            .resolve(Query::from_path("nothing").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("jpillora/nothing"), "{err}");
        assert_eq!(search.calls(), 1);

        // not cached
        resolver
            .resolve(Query::from_path("nothing").unwrap())
            .await
            .unwrap_err();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_search_is_not_recursive() {
        let search = FakeSearch {
            answer: Some(("someone", "elsewhere")),
            ..FakeSearch::default()
        };
        let (resolver, source, search) = setup(FakeSource::default(), search, Duration::from_secs(60));

        let err = resolver
            .resolve(Query::from_path("nothing").unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("someone/elsewhere"), "{err}");
        assert_eq!(search.calls(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_search_with_explicit_owner() {
        let search = FakeSearch {
            answer: Some(("gitleaks", "gitleaks")),
            ..FakeSearch::default()
        };
        let (resolver, _, search) = setup(FakeSource::default(), search, Duration::from_secs(60));

        let err = resolver
            .resolve(Query::from_path("someone/gitleaks").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tag_does_not_search() {
        let source = FakeSource::default().with("jpillora", "serve", "1.9.8", &["serve_linux_amd64.gz"]);
        let search = FakeSearch {
            answer: Some(("jpillora", "serve")),
            ..FakeSearch::default()
        };
        let (resolver, _, search) = setup(source, search, Duration::from_secs(60));

        let err = resolver
            .resolve(Query::from_path("serve@0.0.1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ReleaseTagNotFound(_)));
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_program_rejected_before_fetch() {
        let (resolver, source, _) =
            setup(FakeSource::default(), FakeSearch::default(), Duration::from_secs(60));

        let err = resolver.resolve(Query::new("o", "")).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidQuery(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_forced_owner_and_repo() {
        let source = FakeSource::default().with("gitleaks", "gitleaks", "v8.28.0", GITLEAKS);
        let config = ResolverConfig {
            force_owner: Some("gitleaks".into()),
            force_repo: Some("gitleaks".into()),
            ..ResolverConfig::default()
        };
        let resolver =
            Resolver::with_parts(config, Arc::new(source), Arc::new(FakeSearch::default()));

        let res = resolver.resolve(Query::new("anyone", "anything")).await.unwrap();
        assert_eq!(res.query.owner, "gitleaks");
        assert_eq!(res.query.program, "gitleaks");
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let source = FakeSource {
            delay: Duration::from_millis(30),
            ..FakeSource::default()
        }
        .with("astral-sh", "uv", "0.8.17", UV);
        let (resolver, source, _) = setup(source, FakeSearch::default(), Duration::from_secs(60));
        let resolver = Arc::new(resolver);

        let requests = (0..6).map(|_| {
            let resolver = Arc::clone(&resolver);
            async move { resolver.resolve(Query::new("astral-sh", "uv")).await }
        });
        let results = futures::future::join_all(requests).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(source.calls(), 1);
    }
}
