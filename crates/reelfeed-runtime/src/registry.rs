//! Job registration and interval scheduling.
//!
//! The registry is an explicit object constructed once and passed by
//! reference to whatever triggers runs - there is no ambient singleton.
//! It does NOT enforce single-flight: a manual `run_now` overlapping a
//! scheduled run may race on upserting the same natural key, in which case
//! the last writer wins.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::job::{RunReport, ScrapeJob};

/// Errors from the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("job '{0}' already registered")]
    Duplicate(String),

    #[error("job '{0}' not registered")]
    Unknown(String),
}

/// A runnable, named unit of work.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    /// Run to completion or until `deadline` of wall-clock time has passed.
    async fn run(&self, deadline: Duration) -> RunReport;
}

/// A named scrape job.
pub struct NamedScrapeJob {
    name: String,
    job: ScrapeJob,
}

impl NamedScrapeJob {
    pub fn new(name: impl Into<String>, job: ScrapeJob) -> Self {
        Self {
            name: name.into(),
            job,
        }
    }
}

#[async_trait]
impl Job for NamedScrapeJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, deadline: Duration) -> RunReport {
        self.job.run(deadline).await
    }
}

/// Name-to-job map, constructed once and passed around explicitly.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<BTreeMap<String, Arc<dyn Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, job: Arc<dyn Job>) -> Result<(), RegistryError> {
        let name = job.name().to_string();
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        jobs.insert(name, job);
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.jobs.read().keys().cloned().collect()
    }

    /// Run a registered job immediately, outside any schedule.
    pub async fn run_now(&self, name: &str, deadline: Duration) -> Result<RunReport, RegistryError> {
        // Clone the Arc out so the lock is not held across the await.
        let job = self
            .jobs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;

        tracing::info!(job = name, "manually running job");
        Ok(job.run(deadline).await)
    }
}

/// Runs one registered job on a fixed interval.
///
/// The first run fires immediately, then every `every` thereafter. Each
/// run gets the same per-run `deadline`.
pub struct IntervalScheduler {
    registry: Arc<JobRegistry>,
    every: Duration,
    deadline: Duration,
}

impl IntervalScheduler {
    pub fn new(registry: Arc<JobRegistry>, every: Duration, deadline: Duration) -> Self {
        Self {
            registry,
            every,
            deadline,
        }
    }

    /// Loop forever, running `name` on each tick.
    pub async fn run(&self, name: &str) -> Result<(), RegistryError> {
        // Fail fast on a bad name instead of silently ticking.
        if !self.registry.names().iter().any(|n| n == name) {
            return Err(RegistryError::Unknown(name.to_string()));
        }

        let mut ticker = tokio::time::interval(self.every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            tracing::info!(job = name, "starting scheduled run");
            match self.registry.run_now(name, self.deadline).await {
                Ok(report) => {
                    tracing::info!(
                        job = name,
                        status = ?report.status,
                        saved = report.records_saved,
                        "scheduled run finished"
                    );
                }
                Err(err) => tracing::error!(job = name, error = %err, "scheduled run failed"),
            }
        }
    }
}
