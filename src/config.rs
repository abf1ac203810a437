use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::analysis::scorer::ScoringMode;

/// Full application configuration: `config.toml` for tunables, environment
/// variables for secrets. Both secrets are optional; without them the
/// pipeline runs on simulated posts and the local analyzer.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub scoring: ScoringConfig,
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Search query handed to the post source on every poll.
    pub query: String,
    /// Posts requested per poll, clamped to the API's 10..=100 range.
    pub fetch_limit: usize,
    pub poll_interval_secs: u64,
    /// Capacity of the bounded queue between the poller and the aggregator.
    pub queue_capacity: usize,
    #[serde(skip)]
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub mode: ScoringMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    /// Concurrent in-flight requests to the API.
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    /// How many top-ranked posts per batch get detailed analysis.
    pub top_k: usize,
    /// Hard cap on remote calls per aggregation tick.
    pub batch_cap: usize,
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// How many recent posts the breakdown endpoints analyze.
    pub breakdown_window: usize,
    pub tick_interval_secs: u64,
}

impl AppConfig {
    /// Load `config.toml` and merge in secrets from the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let raw = std::fs::read_to_string("config.toml")
            .context("Failed to read config.toml")?;
        let mut config: AppConfig =
            toml::from_str(&raw).context("Failed to parse config.toml")?;

        config.source.bearer_token = env_secret("TWITTER_BEARER_TOKEN");
        config.gemini.api_key = env_secret("GEMINI_API_KEY");

        Ok(config)
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[source]
query = "technology"
fetch_limit = 20
poll_interval_secs = 30
queue_capacity = 256

[scoring]
mode = "blended"

[gemini]
model = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com/v1beta"
max_concurrent = 3
timeout_secs = 20
top_k = 5
batch_cap = 10

[storage]
data_dir = "data"

[web]
host = "127.0.0.1"
port = 8080
breakdown_window = 200
tick_interval_secs = 10
"#;

    #[test]
    fn sample_config_parses() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.source.query, "technology");
        assert_eq!(config.gemini.top_k, 5);
        assert_eq!(config.web.port, 8080);
        assert!(matches!(config.scoring.mode, ScoringMode::Blended));
        assert!(config.source.bearer_token.is_none());
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn blank_env_secret_counts_as_absent() {
        assert_eq!(env_secret("PULSO_TEST_UNSET_VAR"), None);
    }
}
