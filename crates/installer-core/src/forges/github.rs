//! GitHub REST adapter for [`ReleaseSource`].

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::traits::{RawAsset, ReleaseInfo, ReleasePage, ReleaseSource};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Reads releases from the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Create a source for the API root and token in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder().user_agent(crate::USER_AGENT).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a source that reuses an existing client.
    pub fn with_client(client: Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        }
    }

    fn releases_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{owner}/{repo}/releases", self.api_url)
    }

    /// Send a GET with the API headers, mapping 404 to
    /// [`ResolveError::NotFound`] and other failures to
    /// [`ResolveError::Upstream`].
    async fn get(&self, url: &str) -> Result<Response> {
        debug!(%url, "GET");
        let mut request = self.client.get(url).header(header::ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResolveError::upstream(status, body));
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T> {
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|source| ResolveError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.get(url).await?;
        Self::decode(url, resp).await
    }
}

/// Whether a `Link` header advertises another page.
fn has_next_page(resp: &Response) -> bool {
    resp.headers()
        .get(header::LINK)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|link| link.contains(r#"rel="next""#))
}

#[async_trait]
impl ReleaseSource for GitHubSource {
    async fn latest_release(&self, owner: &str, repo: &str) -> Result<ReleaseInfo> {
        let url = format!("{}/latest", self.releases_url(owner, repo));
        self.get_json(&url).await
    }

    async fn list_releases(&self, owner: &str, repo: &str, page: u32) -> Result<ReleasePage> {
        let url = format!("{}?per_page=100&page={page}", self.releases_url(owner, repo));
        let resp = self.get(&url).await?;
        let has_next = has_next_page(&resp);
        let releases = Self::decode(&url, resp).await?;
        Ok(ReleasePage { releases, has_next })
    }

    async fn release_assets(&self, assets_url: &str) -> Result<Vec<RawAsset>> {
        self.get_json(assets_url).await
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(%url, "GET text");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResolveError::upstream(status, body));
        }
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn source(url: &str, token: Option<&str>) -> GitHubSource {
        let config = ResolverConfig {
            api_url: url.to_string(),
            token: token.map(str::to_string),
            ..ResolverConfig::default()
        };
        GitHubSource::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_latest_release_sends_headers() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/jpillora/serve/releases/latest")
            .match_header("accept", GITHUB_ACCEPT)
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "tag_name": "1.9.8",
                    "assets": [{
                        "name": "serve_1.9.8_linux_amd64.gz",
                        "browser_download_url": "https://example.com/serve_1.9.8_linux_amd64.gz",
                        "size": 4000000,
                        "download_count": 12
                    }]
                }"#,
            )
            .create_async()
            .await;

        let release = source(&server.url(), Some("s3cret"))
            .latest_release("jpillora", "serve")
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(release.tag_name, "1.9.8");
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].size, 4_000_000);
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/nobody/nothing/releases/latest")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let err = source(&server.url(), None)
            .latest_release("nobody", "nothing")
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }

    #[tokio::test]
    async fn test_other_status_is_upstream_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/a/b/releases")
            .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
            .with_status(403)
            .with_body("API rate limit exceeded")
            .create_async()
            .await;

        let err = source(&server.url(), None)
            .list_releases("a", "b", 1)
            .await
            .unwrap_err();
        match err {
            ResolveError::Upstream { status, body } => {
                assert_eq!(status, "Forbidden");
                assert_eq!(body, "API rate limit exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_releases_reads_link_header() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let next = format!(
            r#"<{url}/repos/a/b/releases?per_page=100&page=2>; rel="next", <{url}/repos/a/b/releases?per_page=100&page=2>; rel="last""#
        );
        let _first = server
            .mock("GET", "/repos/a/b/releases")
            .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
            .with_status(200)
            .with_header("link", &next)
            .with_body(r#"[{"tag_name":"v2","assets":[]}]"#)
            .create_async()
            .await;
        let _second = server
            .mock("GET", "/repos/a/b/releases")
            .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
            .with_status(200)
            .with_header("link", r#"<https://api.github.com/x?page=1>; rel="prev""#)
            .with_body(r#"[{"tag_name":"v1","assets":[]}]"#)
            .create_async()
            .await;

        let github = source(&server.url(), None);
        let first = github.list_releases("a", "b", 1).await.unwrap();
        assert!(first.has_next);
        assert_eq!(first.releases[0].tag_name, "v2");

        let second = github.list_releases("a", "b", 2).await.unwrap();
        assert!(!second.has_next);
        assert_eq!(second.releases[0].tag_name, "v1");
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/repos/a/b/releases/latest")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = source(&server.url(), None)
            .latest_release("a", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Decode { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_no_authorization_without_token() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/a/b/releases/latest")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"tag_name":"v1","assets":[]}"#)
            .create_async()
            .await;

        source(&server.url(), Some("")).latest_release("a", "b").await.unwrap();
        m.assert_async().await;
    }
}
