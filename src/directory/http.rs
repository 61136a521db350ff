//! HTTP app directory client.
//!
//! Talks to an FDC3 app directory service:
//! `GET {base}/apps/search?intent=&context=&name=&text=` and `GET {base}/apps/{name}`.

use crate::core::{Error, Result};
use crate::directory::{AppDirectory, DirectoryApp, DirectoryQuery};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::{debug, warn};

/// Directory client over HTTP.
#[derive(Clone, Debug)]
pub struct HttpDirectory {
    /// Service base URL
    base_url: Url,
    /// Shared HTTP client
    client: reqwest::Client,
}

impl HttpDirectory {
    /// Create a client for the directory at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid directory url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("directory url {} cannot be a base", base_url)));
        }
        Ok(Self { base_url, client })
    }

    /// Base URL of the service.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("directory url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of a search request.
    pub fn search_url(&self, query: &DirectoryQuery) -> Result<Url> {
        let mut url = self.endpoint(&["apps", "search"])?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());
        Ok(url)
    }

    /// URL of a lookup request.
    pub fn lookup_url(&self, name: &str) -> Result<Url> {
        self.endpoint(&["apps", name])
    }

    async fn get(&self, url: Url) -> Result<(StatusCode, String)> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::DirectorySearchFailed(format!("{}: {}", url, e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::DirectorySearchFailed(format!("{}: {}", url, e)))?;
        Ok((status, body))
    }
}

/// Parse a search response; malformed bodies count as no results.
pub fn parse_search_response(body: &str) -> Vec<DirectoryApp> {
    match serde_json::from_str::<Vec<DirectoryApp>>(body) {
        Ok(apps) => apps,
        Err(err) => {
            warn!(error = %err, "unparseable directory search response, treating as empty");
            Vec::new()
        }
    }
}

/// Parse a lookup response; malformed bodies count as not found.
pub fn parse_lookup_response(body: &str) -> Option<DirectoryApp> {
    match serde_json::from_str::<DirectoryApp>(body) {
        Ok(app) => Some(app),
        Err(err) => {
            warn!(error = %err, "unparseable directory lookup response, treating as not found");
            None
        }
    }
}

#[async_trait]
impl AppDirectory for HttpDirectory {
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryApp>> {
        let url = self.search_url(query)?;
        debug!(%url, "directory search");
        let (status, body) = self.get(url.clone()).await?;
        if !status.is_success() {
            return Err(Error::DirectorySearchFailed(format!("{} returned {}", url, status)));
        }
        Ok(parse_search_response(&body))
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<DirectoryApp>> {
        let url = self.lookup_url(name)?;
        debug!(%url, "directory lookup");
        let (status, body) = self.get(url.clone()).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::DirectorySearchFailed(format!("{} returned {}", url, status)));
        }
        Ok(parse_lookup_response(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let dir = HttpDirectory::new("https://appd.example.com/v1/").unwrap();
        let query = DirectoryQuery::by_intent("fdc3.ViewChart")
            .with_context("fdc3.instrument")
            .with_text("Trading View");
        let url = dir.search_url(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://appd.example.com/v1/apps/search?intent=fdc3.ViewChart&context=fdc3.instrument&text=Trading+View"
        );
    }

    #[test]
    fn test_lookup_url_escapes_name() {
        let dir = HttpDirectory::new("https://appd.example.com").unwrap();
        let url = dir.lookup_url("News Demo").unwrap();
        assert_eq!(url.as_str(), "https://appd.example.com/apps/News%20Demo");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(HttpDirectory::new("not a url"), Err(Error::Config(_))));
        assert!(matches!(HttpDirectory::new("mailto:someone@example.com"), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_responses() {
        let apps = parse_search_response(r#"[{"name": "A", "start_url": "https://a/"}]"#);
        assert_eq!(apps.len(), 1);
        assert!(parse_search_response("<html>oops</html>").is_empty());

        assert!(parse_lookup_response(r#"{"name": "A"}"#).is_some());
        assert!(parse_lookup_response("").is_none());
    }
}
