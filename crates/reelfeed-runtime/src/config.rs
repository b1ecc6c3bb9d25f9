//! Runtime configuration.
//!
//! A YAML file names the sources to scrape, the providers to try (in
//! priority order - list order is try order), the per-run deadline, and
//! where the database and webhook live. Credentials may live in the file
//! but usually come from the environment; see
//! [`crate::providers::ApiCredential`].
//!
//! ```yaml
//! sources:
//!   - https://nkiri.com/
//! providers:
//!   - kind: gemini
//!     model: gemini-1.5-flash
//!   - kind: openai
//!     model: gpt-4o
//! run_deadline: 30m
//! run_every: 12h
//! database: data/reelfeed.db
//! webhook_url: https://hooks.example.test/reelfeed
//! ```

use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{ProviderRegistry, TextProvider};

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One provider entry; list position is fallback priority.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    /// Provider type registered in the [`ProviderRegistry`].
    pub kind: String,

    #[serde(default)]
    pub model: Option<String>,

    /// Usually omitted in favor of the provider's environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default)]
    pub providers: Vec<ProviderEntry>,

    /// Hard wall-clock bound for one run.
    #[serde(default = "default_deadline", deserialize_with = "humantime_duration")]
    pub run_deadline: Duration,

    /// Interval between scheduled runs.
    #[serde(default = "default_interval", deserialize_with = "humantime_duration")]
    pub run_every: Duration,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            providers: Vec::new(),
            run_deadline: default_deadline(),
            run_every: default_interval(),
            database: default_database(),
            webhook_url: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Load from `path` if it exists, defaults otherwise. Either way, an
    /// empty provider list is filled in from the environment.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            tracing::info!("no config file found, using defaults");
            Self::default()
        };

        if config.providers.is_empty() {
            config.providers = providers_from_env();
        }

        Ok(config)
    }

    /// Instantiate the configured providers, in priority order.
    ///
    /// An entry that fails to build (unknown kind, missing credential) is
    /// logged and skipped; a partial provider list beats no run at all.
    pub fn build_providers(&self, registry: &ProviderRegistry) -> Vec<Arc<dyn TextProvider>> {
        let mut providers = Vec::new();

        for entry in &self.providers {
            let mut provider_config = serde_json::Map::new();
            if let Some(model) = &entry.model {
                provider_config.insert("model".into(), model.clone().into());
            }
            if let Some(api_key) = &entry.api_key {
                provider_config.insert("api_key".into(), api_key.clone().into());
            }

            match registry.create(&entry.kind, &provider_config.into()) {
                Ok(provider) => providers.push(provider),
                Err(err) => {
                    tracing::warn!(kind = %entry.kind, error = %err, "skipping provider");
                }
            }
        }

        providers
    }
}

/// Build the provider priority list from whichever API keys are present in
/// the environment: Gemini first, OpenAI as fallback.
fn providers_from_env() -> Vec<ProviderEntry> {
    let mut entries = Vec::new();

    if std::env::var(crate::providers::GEMINI_API_KEY_ENV).is_ok() {
        entries.push(ProviderEntry {
            kind: "gemini".to_string(),
            model: None,
            api_key: None,
        });
    }
    if std::env::var(crate::providers::OPENAI_API_KEY_ENV).is_ok() {
        entries.push(ProviderEntry {
            kind: "openai".to_string(),
            model: None,
            api_key: None,
        });
    }

    entries
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
}

fn default_sources() -> Vec<String> {
    vec!["https://nkiri.com/".to_string()]
}

fn default_deadline() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_interval() -> Duration {
    Duration::from_secs(12 * 60 * 60)
}

fn default_database() -> String {
    "data/reelfeed.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let yaml = r#"
sources:
  - https://a.test/
  - https://b.test/
providers:
  - kind: gemini
    model: gemini-1.5-pro
  - kind: openai
run_deadline: 10m
run_every: 6h
database: /tmp/test.db
webhook_url: https://hooks.test/x
"#;

        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].kind, "gemini");
        assert_eq!(config.providers[0].model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.run_deadline, Duration::from_secs(600));
        assert_eq!(config.run_every, Duration::from_secs(6 * 3600));
        assert_eq!(config.database, "/tmp/test.db");
        assert_eq!(config.webhook_url.as_deref(), Some("https://hooks.test/x"));
    }

    #[test]
    fn test_defaults_fill_in() {
        let config = RuntimeConfig::from_yaml("providers: []").unwrap();
        assert_eq!(config.sources, vec!["https://nkiri.com/".to_string()]);
        assert_eq!(config.run_deadline, Duration::from_secs(1800));
        assert_eq!(config.database, "data/reelfeed.db");
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_bad_duration_is_an_error() {
        let result = RuntimeConfig::from_yaml("run_deadline: eventually");
        assert!(result.is_err());
    }

    #[test]
    fn test_build_providers_skips_broken_entries() {
        let yaml = r#"
providers:
  - kind: does-not-exist
  - kind: openai
    api_key: test-key
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        let providers = config.build_providers(&ProviderRegistry::with_defaults());

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "openai");
    }
}
