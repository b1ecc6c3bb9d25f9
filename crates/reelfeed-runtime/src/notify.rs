//! Run-result notification.
//!
//! The job driver reports saved records through [`NotificationSink`]; the
//! shipped implementation posts a JSON digest to a configured webhook URL.
//! Notification failure is logged by the caller and never fails a run.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use thiserror::Error;

use reelfeed_core::{ContentKind, ContentRecord};

/// Errors from delivering a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("webhook returned HTTP {status}")]
    Status { status: u16 },
}

/// Downstream consumer of newly-saved records.
///
/// Only invoked when at least one record was saved in a run.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, records: &[ContentRecord], sources: &[String])
        -> Result<(), NotifyError>;
}

/// Posts a digest of saved records to an HTTP webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Build the digest payload: totals, a movie/series split, and the records
/// themselves.
pub fn build_digest(records: &[ContentRecord], sources: &[String]) -> JsonValue {
    let movies: Vec<&ContentRecord> = records
        .iter()
        .filter(|r| r.kind == ContentKind::Movie)
        .collect();
    let series: Vec<&ContentRecord> = records
        .iter()
        .filter(|r| r.kind == ContentKind::Series)
        .collect();

    json!({
        "date": Utc::now().to_rfc3339(),
        "total": records.len(),
        "movie_count": movies.len(),
        "series_count": series.len(),
        "movies": movies,
        "series": series,
        "sources": sources,
    })
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(
        &self,
        records: &[ContentRecord],
        sources: &[String],
    ) -> Result<(), NotifyError> {
        if records.is_empty() {
            tracing::debug!("nothing to notify about");
            return Ok(());
        }

        let digest = build_digest(records, sources);

        let response = self
            .client
            .post(&self.url)
            .json(&digest)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        tracing::info!(count = records.len(), "notification delivered");
        Ok(())
    }
}
