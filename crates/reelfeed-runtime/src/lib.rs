//! # reelfeed-runtime
//!
//! Providers, storage and job orchestration for reelfeed.
//!
//! `reelfeed-core` owns the pure extraction pipeline; this crate owns
//! everything that touches the outside world:
//!
//! - [`providers`]: the [`TextProvider`] trait with Gemini and OpenAI
//!   backends, a factory registry, and secure credential handling
//! - [`ProviderOrchestrator`]: priority-ordered provider fallback
//! - [`PageFetcher`]: HTTP fetch + HTML-to-text reduction of source pages
//! - [`SqliteStore`]: natural-key upsert persistence
//! - [`WebhookNotifier`]: JSON digest delivery for saved records
//! - [`ScrapeJob`]: the run loop tying the above together, bounded by a
//!   wall-clock deadline
//! - [`JobRegistry`] / [`IntervalScheduler`]: explicit job registration
//!   and timer-driven triggering

pub mod config;
pub mod fetch;
pub mod job;
pub mod notify;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod registry;
pub mod store;

// Re-export main types at crate root
pub use config::{ConfigError, ProviderEntry, RuntimeConfig};
pub use fetch::{FetchError, PageFetcher, TextSource};
pub use job::{RunReport, RunStatus, ScrapeJob};
pub use notify::{NotificationSink, NotifyError, WebhookNotifier};
pub use orchestrator::{OrchestratedExtraction, ProviderOrchestrator};
pub use providers::{
    GenerationConfig, ProviderError, ProviderRegistry, TextProvider,
};
pub use registry::{IntervalScheduler, Job, JobRegistry, NamedScrapeJob, RegistryError};
pub use store::{ContentStore, SqliteStore, StoreError, StoreStats, StoredRecord};
