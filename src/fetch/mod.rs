//! Fetch capabilities: blocking HTTP plus Atom/RSS parsing.
//!
//! The orchestrator talks to a [`FeedClient`] trait object so ingestion can
//! be tested without a network. The production implementation is a blocking
//! reqwest client with a fixed 20-second deadline; a fetch either completes,
//! times out, or fails, and the orchestrator converts failures into skips.

mod feed;

pub use feed::parse_feed;

use std::time::Duration;

use crate::error::FetchError;

/// Fixed per-request deadline.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Conditional-fetch cache validators lifted from response headers.
///
/// Persisted with each snapshot so a future conditional re-fetch can use
/// them; absence is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    /// `ETag` response header, verbatim.
    pub etag: Option<String>,
    /// `Last-Modified` response header, verbatim.
    pub last_modified: Option<String>,
}

/// One parsed entry from a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title.
    pub title: String,
    /// Entry link.
    pub url: String,
    /// Publication time as seconds since epoch; 0 if unknown.
    pub published_ts: i64,
    /// Entry body, if the feed carried one.
    pub content: String,
}

/// Result of fetching a feed source.
#[derive(Debug, Clone)]
pub struct FeedFetch {
    /// Parsed entries, Atom first with a generic `item` fallback.
    pub entries: Vec<FeedEntry>,
    /// The raw response body, persisted with the snapshot.
    pub body: String,
    /// Cache validators from the response.
    pub meta: ResponseMeta,
}

/// Result of fetching a plain page source.
#[derive(Debug, Clone)]
pub struct PageFetch {
    /// The raw response body.
    pub body: String,
    /// Cache validators from the response.
    pub meta: ResponseMeta,
}

/// The fetch capability consumed by the ingestion orchestrator.
pub trait FeedClient {
    /// Fetches and parses a feed URL.
    ///
    /// # Errors
    /// Fails with [`FetchError`] on non-2xx status, transport failure, or
    /// malformed markup.
    fn fetch_feed(&self, url: &str) -> Result<FeedFetch, FetchError>;

    /// Fetches a page URL without parsing.
    ///
    /// # Errors
    /// Same failure contract as [`FeedClient::fetch_feed`].
    fn fetch_page(&self, url: &str) -> Result<PageFetch, FetchError>;
}

/// Blocking HTTP implementation of [`FeedClient`].
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Builds the client with the fixed fetch deadline.
    ///
    /// # Errors
    /// Fails if the underlying TLS/connection stack cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        let inner = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("practica/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientSetup {
                message: e.to_string(),
            })?;
        Ok(Self { inner })
    }

    fn get(&self, url: &str) -> Result<(String, ResponseMeta), FetchError> {
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        };
        let meta = ResponseMeta {
            etag: header(reqwest::header::ETAG),
            last_modified: header(reqwest::header::LAST_MODIFIED),
        };

        let body = response.text().map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok((body, meta))
    }
}

impl FeedClient for HttpClient {
    fn fetch_feed(&self, url: &str) -> Result<FeedFetch, FetchError> {
        let (body, meta) = self.get(url)?;
        let entries = parse_feed(&body)?;
        Ok(FeedFetch {
            entries,
            body,
            meta,
        })
    }

    fn fetch_page(&self, url: &str) -> Result<PageFetch, FetchError> {
        let (body, meta) = self.get(url)?;
        Ok(PageFetch { body, meta })
    }
}
