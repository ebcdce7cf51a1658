// src/news/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One headline as parsed from a feed. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawNewsArticle {
    pub headline: String,
    pub summary: Option<String>,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
}

/// Closed category set the AI scoring step must pick from; anything else it
/// emits is coerced to `Macro`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NewsCategory {
    #[default]
    Macro,
    Earnings,
    Policy,
    Technical,
}

impl NewsCategory {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            s if s.eq_ignore_ascii_case("earnings") => Self::Earnings,
            s if s.eq_ignore_ascii_case("policy") => Self::Policy,
            s if s.eq_ignore_ascii_case("technical") => Self::Technical,
            _ => Self::Macro,
        }
    }
}

/// Article plus its AI analysis; one per surviving (non-duplicate) article.
/// `sentiment` is clamped to [-1, 1] and `relevance_score` to [0, 100]
/// before this value is constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedNewsSignal {
    #[serde(flatten)]
    pub article: RawNewsArticle,
    pub sentiment: f64,
    pub category: NewsCategory,
    pub rationale: String,
    pub relevance_score: f64,
}

/// One news outlet. `fetch_articles` must swallow per-feed failures and
/// return whatever it got; a provider as a whole only "fails" by returning
/// an empty list.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// HEAD-style probe of the outlet, bounded at 3s. False on any failure.
    async fn is_available(&self) -> bool;

    async fn fetch_articles(&self) -> Vec<RawNewsArticle>;
}
