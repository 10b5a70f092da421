//! Page fetching with a single `.html` fallback.
//!
//! The archive serves most pages at their directory URL, but some older pages
//! only answer at `<url>.html`. [`Fetcher`] tries the URL as given and, if that
//! fails for any reason, tries once more with `.html` appended. A second
//! failure is logged and reported as `None` so the caller can skip the unit of
//! work.
//!
//! # Architecture
//!
//! - [`PageSource`]: raw GET of a URL into a body string
//! - [`HttpSource`]: the `reqwest` implementation used in production
//! - [`Fetcher`]: wraps any source with the fallback and HTML parsing

use std::time::Instant;

use scraper::Html;
use tracing::{debug, instrument, warn};

use crate::errors::FetchError;

/// Anything that can GET a URL and hand back its body.
pub trait PageSource {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain HTTP source. No custom headers and no timeout beyond the transport
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl PageSource for HttpSource {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Fetches and parses pages, falling back to `<url>.html` once.
#[derive(Debug, Clone)]
pub struct Fetcher<S> {
    source: S,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch the raw body of `url`, trying `url.html` once on failure.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_body(&self, url: &str) -> Option<String> {
        let t0 = Instant::now();
        match self.source.get(url).await {
            Ok(body) => {
                debug!(elapsed_ms = t0.elapsed().as_millis() as u64, bytes = body.len(), "Fetched page");
                return Some(body);
            }
            Err(e) => {
                debug!(error = %e, "Fetch failed; trying .html fallback");
            }
        }

        let fallback = format!("{url}.html");
        match self.source.get(&fallback).await {
            Ok(body) => {
                debug!(%fallback, bytes = body.len(), "Fetched page through fallback");
                Some(body)
            }
            Err(e) => {
                warn!(%url, %fallback, error = %e, "Page could not be fetched");
                None
            }
        }
    }

    /// Fetch `url` and parse it into a document tree.
    pub async fn fetch(&self, url: &str) -> Option<Html> {
        self.fetch_body(url)
            .await
            .map(|body| Html::parse_document(&body))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticSite;
    use super::*;
    use scraper::Selector;

    #[tokio::test]
    async fn test_fetch_direct_hit() {
        let site = StaticSite::new().page("http://a/V1/", "<p>hello</p>");
        let fetcher = Fetcher::new(&site);

        assert_eq!(fetcher.fetch_body("http://a/V1/").await.as_deref(), Some("<p>hello</p>"));
        assert_eq!(site.requests(), vec!["http://a/V1/"]);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_html_once() {
        let site = StaticSite::new().page("http://a/V1/N2.html", "<div id=\"main\"></div>");
        let fetcher = Fetcher::new(&site);

        let doc = fetcher.fetch("http://a/V1/N2").await.expect("fallback page");
        let main = Selector::parse("#main").unwrap();
        assert_eq!(doc.select(&main).count(), 1);
        assert_eq!(site.requests(), vec!["http://a/V1/N2", "http://a/V1/N2.html"]);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_fallback() {
        let site = StaticSite::new();
        let fetcher = Fetcher::new(&site);

        assert!(fetcher.fetch("http://a/missing/").await.is_none());
        assert_eq!(site.requests().len(), 2);
    }
}
