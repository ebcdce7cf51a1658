// src/market/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// One quote as fetched from an upstream endpoint. Immutable once built;
/// both providers normalize their source-specific payloads into this shape
/// (change_percent is always percentage points, never a fraction).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MacdResult {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Derived per cycle by a full recompute; never persisted as a delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicalIndicators {
    pub vwap: f64,
    pub sma50: f64,
    pub ema9: f64,
    pub ema21: f64,
    pub rsi: f64,
    pub macd: MacdResult,
    pub vix: f64,
}

/// Quote plus indicators plus provenance. Each fetch cycle supersedes the
/// previous snapshot wholesale; the service keeps at most one in memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSnapshot {
    #[serde(flatten)]
    pub quote: RawQuote,
    #[serde(flatten)]
    pub indicators: TechnicalIndicators,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// A single upstream quote source. Implementations must bound both calls
/// with their own timeouts (3s probe, 5s fetch) and never panic.
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best-effort liveness probe. Any failure means false; never errors.
    async fn is_available(&self) -> bool;

    async fn fetch_quote(&self) -> Result<RawQuote, MarketError>;
}
