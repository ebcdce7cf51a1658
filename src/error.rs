// src/error.rs
use thiserror::Error;

/// Failures on the market-data path. Providers surface `Fetch`; the service
/// surfaces `AllProvidersFailed` only when no provider succeeded and no
/// cached snapshot exists to degrade to.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Liveness probe returned false. Not fatal; the service skips to the
    /// next provider.
    #[error("{provider} is not available")]
    Unavailable { provider: &'static str },

    /// Non-2xx status, timeout, or a payload missing expected fields.
    #[error("failed to fetch from {provider}: {reason}")]
    Fetch {
        provider: &'static str,
        reason: String,
    },

    #[error("all market data providers failed. Last error: {last_error}")]
    AllProvidersFailed { last_error: String },
}

impl MarketError {
    pub fn fetch(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            provider,
            reason: reason.into(),
        }
    }
}

/// Failures on the news path. These never escape the aggregation service;
/// a failing feed or provider just contributes zero articles.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("feed fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
}
