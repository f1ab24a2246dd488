//! Guess a repository from a bare program name via "I'm feeling lucky".
//!
//! The search engines answer a lucky query with a redirect to their top
//! hit. Only the `Location` header is read, so the client never follows
//! redirects.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, header, redirect};
use thiserror::Error;
use tracing::{debug, info};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_3) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/81.0.4044.122 Safari/537.36";

static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://github\.com/([\w-]+)/([\w.-]+)")
        .unwrap_or_else(|e| panic!("invalid repository pattern: {e}"))
});

/// Why a search produced no repository.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The search engine could not be reached.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine answered with a page instead of a redirect.
    #[error("non-redirect response: {0}")]
    NonRedirect(u16),

    /// The redirect did not point at a GitHub repository.
    #[error("github url not found in redirect: {0}")]
    NoRepository(String),

    /// Every backend failed.
    #[error("not found")]
    Exhausted,
}

/// A repository found by search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMatch {
    /// Account or organisation.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

/// Finds the repository that most likely publishes `program`.
#[async_trait]
pub trait RepoSearch: Send + Sync {
    /// Best guess at the repository behind `program`.
    async fn find_repo(&self, program: &str) -> Result<RepoMatch, SearchError>;
}

/// A search engine with a lucky-redirect endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchBackend {
    /// `GET {base}/html?q=! <phrase>`
    DuckDuckGo {
        /// Scheme and host, no trailing slash.
        base: String,
    },
    /// `GET {base}/search?btnI=&q=<phrase>`
    Google {
        /// Scheme and host, no trailing slash.
        base: String,
    },
}

impl SearchBackend {
    /// The public `DuckDuckGo` HTML endpoint.
    pub fn duckduckgo() -> Self {
        Self::DuckDuckGo {
            base: "https://html.duckduckgo.com".to_string(),
        }
    }

    /// The public Google endpoint.
    pub fn google() -> Self {
        Self::Google {
            base: "https://www.google.com".to_string(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo { .. } => "duckduckgo",
            Self::Google { .. } => "google",
        }
    }

    fn request(&self, client: &Client, phrase: &str) -> reqwest::RequestBuilder {
        match self {
            Self::DuckDuckGo { base } => client
                .get(format!("{base}/html"))
                .query(&[("q", format!("! {phrase}"))]),
            Self::Google { base } => client
                .get(format!("{base}/search"))
                .query(&[("btnI", ""), ("q", phrase)]),
        }
    }
}

/// [`RepoSearch`] over public web search engines, tried in order.
#[derive(Debug, Clone)]
pub struct WebSearch {
    client: Client,
    backends: Vec<SearchBackend>,
}

impl WebSearch {
    /// `DuckDuckGo` first, then Google.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> reqwest::Result<Self> {
        Self::with_backends(vec![SearchBackend::duckduckgo(), SearchBackend::google()])
    }

    /// Use a custom backend list (e.g. local test servers).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_backends(backends: Vec<SearchBackend>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self { client, backends })
    }

    async fn capture_location(
        &self,
        backend: &SearchBackend,
        phrase: &str,
    ) -> Result<RepoMatch, SearchError> {
        let resp = backend
            .request(&self.client, phrase)
            .header(header::ACCEPT, "*/*")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_redirection() {
            return Err(SearchError::NonRedirect(status.as_u16()));
        }
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let caps = GITHUB_REPO_RE
            .captures(location)
            .ok_or_else(|| SearchError::NoRepository(location.to_string()))?;
        Ok(RepoMatch {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
        })
    }
}

#[async_trait]
impl RepoSearch for WebSearch {
    async fn find_repo(&self, program: &str) -> Result<RepoMatch, SearchError> {
        let phrase = format!("{program} site:github.com");
        for backend in &self.backends {
            match self.capture_location(backend, &phrase).await {
                Ok(found) => {
                    info!(
                        backend = backend.name(),
                        "search found {}/{}", found.owner, found.repo
                    );
                    return Ok(found);
                }
                Err(e) => debug!(backend = backend.name(), %phrase, "search failed: {e}"),
            }
        }
        Err(SearchError::Exhausted)
    }
}
