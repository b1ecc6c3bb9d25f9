//! Source page fetching.
//!
//! [`TextSource`] is the seam the job driver depends on; [`PageFetcher`]
//! is the real implementation: HTTP via reqwest, HTML body text via the
//! `scraper` crate, transient failures retried with exponential backoff.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;

/// Errors from fetching a source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("no readable text at {0}")]
    EmptyPage(String),
}

impl FetchError {
    /// Transport-level and server-side failures are worth retrying; a 404
    /// or an empty page is not going to improve.
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Body(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::EmptyPage(_) => false,
        }
    }
}

/// Something that can turn a source identifier into raw text.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches a page over HTTP and reduces it to its visible body text.
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        // Browser-like UA; some listing sites reject default client agents.
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }
}

#[async_trait]
impl TextSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let html = (|| self.fetch_html(url))
            .retry(ExponentialBuilder::default().with_max_times(2))
            .when(FetchError::is_transient)
            .notify(|err, dur| {
                tracing::warn!(url, error = %err, retry_in = ?dur, "fetch failed, retrying");
            })
            .await?;

        let text = extract_body_text(&html);
        if text.is_empty() {
            return Err(FetchError::EmptyPage(url.to_string()));
        }

        tracing::debug!(url, bytes = text.len(), "fetched source text");
        Ok(text)
    }
}

/// Flatten the `<body>` of an HTML document to whitespace-joined text.
///
/// Kept synchronous on purpose: `Html` is not `Send` and must not live
/// across an await point.
fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body").expect("static selector");

    document
        .select(&selector)
        .next()
        .map(|body| {
            body.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
