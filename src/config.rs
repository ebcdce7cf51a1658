// src/config.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

fn default_market_ttl_secs() -> u64 {
    15
}
fn default_news_ttl_secs() -> u64 {
    120
}
fn default_top_articles() -> usize {
    20
}
fn default_ai_pacing_ms() -> u64 {
    100
}
fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}

/// Crate-wide settings, loaded from a JSON file. Every field has a default,
/// so a missing or partial file degrades to the documented behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Market snapshot cache validity window.
    #[serde(default = "default_market_ttl_secs")]
    pub market_cache_ttl_secs: u64,
    /// Processed-news cache validity window.
    #[serde(default = "default_news_ttl_secs")]
    pub news_cache_ttl_secs: u64,
    /// How many articles survive the sort-and-truncate step.
    #[serde(default = "default_top_articles")]
    pub top_articles: usize,
    /// Pause between successive AI scoring calls.
    #[serde(default = "default_ai_pacing_ms")]
    pub ai_pacing_ms: u64,
    /// Whether AI scoring is enabled at all; when false every article gets
    /// the neutral default analysis.
    #[serde(default)]
    pub ai_enabled: bool,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    /// "ENV" means: read from OPENAI_API_KEY.
    #[serde(default = "default_api_key")]
    pub ai_api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        serde_json::from_str("{}").expect("defaults deserialize")
    }
}

impl Settings {
    /// Load from a JSON file, resolving the `"ENV"` api-key sentinel.
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        let mut cfg: Settings = serde_json::from_str(&data)?;

        if cfg.ai_api_key.trim().eq_ignore_ascii_case("env") {
            cfg.ai_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        }

        Ok(cfg)
    }
}
