//! Text-generation provider abstractions.
//!
//! This module defines the trait all providers implement and includes the
//! Gemini and OpenAI backends. Providers are interchangeable behind
//! [`TextProvider`]; the orchestrator only ever sees the trait.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling. See
//! [`ApiCredential`] for the patterns.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod factory;
mod gemini;
mod openai;
pub mod secrets;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use gemini::{GeminiProvider, GeminiProviderFactory, GEMINI_API_KEY_ENV};
pub use openai::{OpenAiProvider, OpenAiProviderFactory, OPENAI_API_KEY_ENV};
pub use secrets::{ApiCredential, CredentialSource};

/// Errors from text-generation providers.
///
/// The orchestrator treats every variant the same way - skip to the next
/// provider - but the distinction matters for logs and retry policy.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("authentication failed")]
    Auth,

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("completion contained no text")]
    EmptyCompletion,
}

/// Options applied to every generation request a provider makes.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Temperature; 0.0 keeps extraction output deterministic.
    pub temperature: f32,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A text-generation backend.
///
/// The model, credentials and generation options belong to the instance;
/// callers hand over a prompt and get raw text back. Failures are returned,
/// never panicked - the orchestrator decides what a failure means.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Provider name for logs and result attribution.
    fn name(&self) -> &str;
}
