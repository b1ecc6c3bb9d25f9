//! Provider fallback orchestration.
//!
//! Tries configured providers in priority order and accepts the first one
//! whose response normalizes to at least one valid record. A provider that
//! errors - auth, quota, timeout, transport - counts the same as one that
//! returns unusable text: the orchestrator moves on. Provider trouble is
//! never escalated to the caller; the worst case is an empty, unattributed
//! extraction.

use std::sync::Arc;

use reelfeed_core::{normalize, Extraction};

use crate::providers::TextProvider;

/// An extraction plus the provider that produced it.
#[derive(Debug, Default)]
pub struct OrchestratedExtraction {
    pub extraction: Extraction,

    /// Name of the provider whose output survived normalization; `None`
    /// when every provider failed or normalized to nothing.
    pub provider: Option<String>,
}

impl OrchestratedExtraction {
    pub fn is_empty(&self) -> bool {
        self.extraction.is_empty()
    }
}

/// Priority-ordered provider fallback.
pub struct ProviderOrchestrator {
    providers: Vec<Arc<dyn TextProvider>>,
}

impl ProviderOrchestrator {
    /// Build from providers in try-order: first entry is tried first.
    pub fn new(providers: Vec<Arc<dyn TextProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run the prompt through providers until one yields usable records.
    pub async fn extract(&self, prompt: &str) -> OrchestratedExtraction {
        for provider in &self.providers {
            let raw = match provider.generate(prompt).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "provider call failed, trying next"
                    );
                    continue;
                }
            };

            let extraction = normalize(&raw);
            if extraction.is_empty() {
                tracing::debug!(
                    provider = provider.name(),
                    discarded = extraction.discarded.total(),
                    "response normalized to nothing, trying next"
                );
                continue;
            }

            tracing::info!(
                provider = provider.name(),
                records = extraction.records.len(),
                tier = ?extraction.tier,
                "extraction succeeded"
            );
            return OrchestratedExtraction {
                extraction,
                provider: Some(provider.name().to_string()),
            };
        }

        OrchestratedExtraction::default()
    }
}
