//! The content scrape job: one run across configured sources.
//!
//! A run walks the source list sequentially - fetch, prompt, orchestrate,
//! upsert - absorbing every per-source and per-record failure along the
//! way. The only thing that ends a run early is the wall-clock deadline,
//! checked cooperatively at the top of each source iteration; in-flight
//! calls are never interrupted mid-call.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reelfeed_core::ContentRecord;

use crate::fetch::TextSource;
use crate::notify::NotificationSink;
use crate::orchestrator::ProviderOrchestrator;
use crate::prompts;
use crate::store::ContentStore;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    /// The deadline expired before every source was visited. Records saved
    /// up to that point stay saved.
    Cancelled,
}

/// What a run accomplished. Partial failures show up as counts here, never
/// as errors.
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub sources_total: usize,
    /// Sources skipped because their fetch failed.
    pub sources_skipped: usize,
    pub records_saved: usize,
    /// Records that extracted cleanly but failed to persist.
    pub records_failed: usize,
    /// Every record that was actually saved, for downstream notification.
    pub saved: Vec<ContentRecord>,
}

/// One scrape-and-extract job over an ordered source list.
///
/// Sources are processed strictly sequentially: the fetch targets and the
/// providers are rate-limited, and sequential upserts keep natural-key
/// ordering deterministic within a run.
pub struct ScrapeJob {
    source: Arc<dyn TextSource>,
    store: Arc<dyn ContentStore>,
    orchestrator: ProviderOrchestrator,
    sink: Option<Arc<dyn NotificationSink>>,
    source_urls: Vec<String>,
    status: RwLock<RunStatus>,
}

impl ScrapeJob {
    pub fn new(
        source: Arc<dyn TextSource>,
        store: Arc<dyn ContentStore>,
        orchestrator: ProviderOrchestrator,
        sink: Option<Arc<dyn NotificationSink>>,
        source_urls: Vec<String>,
    ) -> Self {
        Self {
            source,
            store,
            orchestrator,
            sink,
            source_urls,
            status: RwLock::new(RunStatus::Idle),
        }
    }

    /// The job's current lifecycle state.
    pub fn status(&self) -> RunStatus {
        *self.status.read()
    }

    /// Execute one run, bounded by `deadline` of wall-clock time.
    pub async fn run(&self, deadline: Duration) -> RunReport {
        let started = Instant::now();
        *self.status.write() = RunStatus::Running;

        tracing::info!(sources = self.source_urls.len(), "starting content scrape run");

        let mut report = RunReport {
            status: RunStatus::Running,
            sources_total: self.source_urls.len(),
            sources_skipped: 0,
            records_saved: 0,
            records_failed: 0,
            saved: Vec::new(),
        };

        let mut cancelled = false;

        for url in &self.source_urls {
            // Cooperative cancellation: only observed here, between sources.
            if started.elapsed() >= deadline {
                tracing::warn!(
                    elapsed = ?started.elapsed(),
                    "run deadline exceeded, stopping source iteration"
                );
                cancelled = true;
                break;
            }

            let text = match self.source.fetch(url).await {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "fetch failed, skipping source");
                    report.sources_skipped += 1;
                    continue;
                }
            };

            let prompt = prompts::build_extraction_prompt(&text);
            let outcome = self.orchestrator.extract(&prompt).await;

            if outcome.is_empty() {
                tracing::info!(url = %url, "no content extracted");
                continue;
            }

            tracing::info!(
                url = %url,
                count = outcome.extraction.records.len(),
                provider = outcome.provider.as_deref().unwrap_or("none"),
                "extracted content"
            );

            for mut record in outcome.extraction.records {
                record.source_url = Some(url.clone());

                match self.store.upsert(&record).await {
                    Ok(()) => {
                        report.records_saved += 1;
                        report.saved.push(record);
                    }
                    Err(err) => {
                        tracing::warn!(title = %record.title, error = %err, "failed to save record");
                        report.records_failed += 1;
                    }
                }
            }
        }

        report.status = if cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        *self.status.write() = report.status;

        tracing::info!(
            status = ?report.status,
            saved = report.records_saved,
            skipped = report.sources_skipped,
            "content scrape run finished"
        );

        // Notification is best-effort and only fires when something landed.
        if !report.saved.is_empty() {
            if let Some(sink) = &self.sink {
                if let Err(err) = sink.notify(&report.saved, &self.source_urls).await {
                    tracing::warn!(error = %err, "notification failed");
                }
            }
        }

        report
    }
}
