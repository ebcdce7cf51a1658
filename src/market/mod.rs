// src/market/mod.rs
//! Market-data pipeline: provider fallback, indicator recompute, TTL cache.

pub mod history;
pub mod indicators;
pub mod providers;
pub mod types;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::MarketError;
use types::{MarketSnapshot, QuoteProvider};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "market_fetch_total",
            "Market snapshots assembled from a live provider."
        );
        describe_counter!("market_cache_hits_total", "Fresh-cache short circuits.");
        describe_counter!(
            "market_stale_served_total",
            "Stale snapshots served because every provider failed."
        );
        describe_counter!(
            "market_provider_errors_total",
            "Provider probe skips and fetch errors."
        );
    });
}

struct CacheSlot {
    snapshot: Option<MarketSnapshot>,
    fetched_at: Option<Instant>,
}

/// Orchestrates the quote providers in fixed priority order, merges the raw
/// quote with freshly computed indicators, and keeps the single most recent
/// snapshot as a short-TTL cache.
///
/// The cache lock is only held for the read-check and the write, never
/// across a network call; concurrent callers may redundantly refetch within
/// one TTL window.
pub struct MarketDataService {
    providers: Vec<Box<dyn QuoteProvider>>,
    cache: Mutex<CacheSlot>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MarketDataService {
    /// Production wiring: NSE first, Yahoo Finance as fallback, 15s TTL.
    pub fn new() -> Self {
        Self::with_providers(
            vec![
                Box::new(providers::NseProvider::new()),
                Box::new(providers::YahooFinanceProvider::new()),
            ],
            Duration::from_secs(15),
            Arc::new(SystemClock),
        )
    }

    /// Order of `providers` is the fallback priority order.
    pub fn with_providers(
        providers: Vec<Box<dyn QuoteProvider>>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            providers,
            cache: Mutex::new(CacheSlot {
                snapshot: None,
                fetched_at: None,
            }),
            ttl,
            clock,
        }
    }

    fn fresh_cached(&self) -> Option<MarketSnapshot> {
        let slot = self.cache.lock().expect("market cache mutex poisoned");
        let fetched_at = slot.fetched_at?;
        if self.clock.now().duration_since(fetched_at) < self.ttl {
            slot.snapshot.clone()
        } else {
            None
        }
    }

    fn store(&self, snapshot: MarketSnapshot) {
        let mut slot = self.cache.lock().expect("market cache mutex poisoned");
        slot.snapshot = Some(snapshot);
        slot.fetched_at = Some(self.clock.now());
    }

    /// Fetch a complete snapshot, honoring the cache when `use_cache` is set.
    ///
    /// Providers are tried in priority order with early exit on the first
    /// success; a success always overwrites the cache, even when `use_cache`
    /// is false. When every provider fails, a stale cached snapshot is
    /// served with its source marked `" (cached)"`; with no cache at all the
    /// call fails with [`MarketError::AllProvidersFailed`].
    pub async fn fetch_market_data(
        &self,
        use_cache: bool,
    ) -> Result<MarketSnapshot, MarketError> {
        if use_cache {
            if let Some(cached) = self.fresh_cached() {
                debug!("returning cached market data");
                counter!("market_cache_hits_total").increment(1);
                return Ok(cached);
            }
        }

        let mut last_error: Option<MarketError> = None;

        for provider in &self.providers {
            let name = provider.name();
            debug!(provider = name, "attempting market data fetch");

            if !provider.is_available().await {
                info!(provider = name, "provider not available, trying next");
                counter!("market_provider_errors_total").increment(1);
                last_error = Some(MarketError::Unavailable { provider: name });
                continue;
            }

            match provider.fetch_quote().await {
                Ok(quote) => {
                    info!(provider = name, price = quote.price, "quote fetched");
                    let indicators = history::compute_indicators(quote.price);
                    let snapshot = MarketSnapshot {
                        quote,
                        indicators,
                        source: name.to_string(),
                        last_updated: Utc::now(),
                    };
                    self.store(snapshot.clone());
                    counter!("market_fetch_total").increment(1);
                    return Ok(snapshot);
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "provider fetch failed");
                    last_error = Some(e);
                }
            }
        }

        // Degraded mode: everything failed but an older snapshot exists.
        let stale = {
            let slot = self.cache.lock().expect("market cache mutex poisoned");
            slot.snapshot.clone()
        };
        if let Some(mut snapshot) = stale {
            warn!("all providers failed, returning stale cached data");
            counter!("market_stale_served_total").increment(1);
            snapshot.source = format!("{} (cached)", snapshot.source);
            return Ok(snapshot);
        }

        Err(MarketError::AllProvidersFailed {
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }

    /// Last successfully fetched snapshot, regardless of age.
    pub fn cached_snapshot(&self) -> Option<MarketSnapshot> {
        self.cache
            .lock()
            .expect("market cache mutex poisoned")
            .snapshot
            .clone()
    }

    pub fn clear_cache(&self) {
        let mut slot = self.cache.lock().expect("market cache mutex poisoned");
        slot.snapshot = None;
        slot.fetched_at = None;
    }
}

impl Default for MarketDataService {
    fn default() -> Self {
        Self::new()
    }
}
