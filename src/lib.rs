// src/lib.rs
// Library core of the demo trading dashboard. The HTTP route layer, trade
// persistence and UI live in the embedding service; this crate only knows
// how to produce market snapshots and scored news signals on demand.

pub mod ai;
pub mod clock;
pub mod config;
pub mod error;
pub mod market;
pub mod news;

// ---- Re-exports for stable public API ----
pub use crate::ai::{ArticleAnalysis, CompletionBackend, SentimentScorer};
pub use crate::clock::{Clock, SystemClock};
pub use crate::config::Settings;
pub use crate::error::{MarketError, NewsError};
pub use crate::market::types::{MarketSnapshot, QuoteProvider, RawQuote, TechnicalIndicators};
pub use crate::market::MarketDataService;
pub use crate::news::types::{NewsCategory, NewsProvider, ProcessedNewsSignal, RawNewsArticle};
pub use crate::news::NewsAggregationService;
