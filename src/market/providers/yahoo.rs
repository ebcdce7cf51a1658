// src/market/providers/yahoo.rs
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use serde::Deserialize;

use super::{FETCH_TIMEOUT, PROBE_TIMEOUT};
use crate::error::MarketError;
use crate::market::types::{QuoteProvider, RawQuote};

const PROVIDER: &str = "Yahoo Finance";

/// Quote provider for the Yahoo Finance chart endpoint (^NSEI). Serves as
/// the fallback when NSE itself is unreachable.
pub struct YahooFinanceProvider {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}
#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Vec<ChartResult>,
}
#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Meta,
    indicators: Option<Indicators>,
}
#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "previousClose")]
    previous_close: Option<f64>,
    #[serde(rename = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}
#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Candles>,
}
/// Candle arrays carry nulls for gaps; every element is optional.
#[derive(Debug, Default, Deserialize)]
struct Candles {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl YahooFinanceProvider {
    pub fn new() -> Self {
        Self::with_base_url("https://query1.finance.yahoo.com/v8/finance")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn quote_from_chart(result: &ChartResult) -> Result<RawQuote, MarketError> {
        let meta = &result.meta;
        let price = meta
            .regular_market_price
            .or(meta.previous_close)
            .ok_or_else(|| MarketError::fetch(PROVIDER, "no price in chart meta"))?;
        let previous_close = meta
            .chart_previous_close
            .or(meta.previous_close)
            .unwrap_or(price);

        let change = price - previous_close;
        let change_percent = if previous_close != 0.0 {
            (change / previous_close) * 100.0
        } else {
            0.0
        };

        let empty = Candles::default();
        let candles = result
            .indicators
            .as_ref()
            .and_then(|i| i.quote.first())
            .unwrap_or(&empty);

        let open = candles
            .open
            .iter()
            .flatten()
            .next()
            .copied()
            .unwrap_or(price);
        let high = candles
            .high
            .iter()
            .flatten()
            .fold(f64::MIN, |acc, h| acc.max(*h));
        let low = candles
            .low
            .iter()
            .flatten()
            .fold(f64::MAX, |acc, l| acc.min(*l));
        let volume: u64 = candles.volume.iter().flatten().sum();

        Ok(RawQuote {
            symbol: "NIFTY 50".to_string(),
            price,
            change,
            change_percent,
            open,
            high: if high == f64::MIN { price } else { high },
            low: if low == f64::MAX { price } else { low },
            previous_close,
            volume,
            timestamp: Utc::now(),
        })
    }
}

impl Default for YahooFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/chart/%5ENSEI?interval=1d&range=1d", self.base_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn fetch_quote(&self) -> Result<RawQuote, MarketError> {
        let url = format!("{}/chart/%5ENSEI?interval=1m&range=1d", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                counter!("market_provider_errors_total").increment(1);
                MarketError::fetch(PROVIDER, e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            counter!("market_provider_errors_total").increment(1);
            return Err(MarketError::fetch(
                PROVIDER,
                format!("Yahoo Finance API returned {status}"),
            ));
        }

        let body: ChartEnvelope = resp
            .json()
            .await
            .map_err(|e| MarketError::fetch(PROVIDER, e.to_string()))?;

        let result = body
            .chart
            .result
            .first()
            .ok_or_else(|| MarketError::fetch(PROVIDER, "invalid Yahoo Finance response format"))?;

        Self::quote_from_chart(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_with_null_candles_falls_back_to_meta_price() {
        let result = ChartResult {
            meta: Meta {
                regular_market_price: Some(25_100.0),
                previous_close: Some(25_000.0),
                chart_previous_close: Some(25_000.0),
            },
            indicators: None,
        };
        let q = YahooFinanceProvider::quote_from_chart(&result).unwrap();
        assert_eq!(q.price, 25_100.0);
        assert_eq!(q.high, 25_100.0);
        assert_eq!(q.low, 25_100.0);
        assert!((q.change - 100.0).abs() < 1e-9);
        assert!((q.change_percent - 0.4).abs() < 1e-9);
        assert_eq!(q.volume, 0);
    }

    #[test]
    fn candle_gaps_are_skipped_in_aggregates() {
        let result = ChartResult {
            meta: Meta {
                regular_market_price: Some(100.0),
                previous_close: Some(100.0),
                chart_previous_close: None,
            },
            indicators: Some(Indicators {
                quote: vec![Candles {
                    open: vec![None, Some(99.0)],
                    high: vec![Some(101.0), None, Some(103.0)],
                    low: vec![None, Some(98.0)],
                    volume: vec![Some(10), None, Some(5)],
                }],
            }),
        };
        let q = YahooFinanceProvider::quote_from_chart(&result).unwrap();
        assert_eq!(q.open, 99.0);
        assert_eq!(q.high, 103.0);
        assert_eq!(q.low, 98.0);
        assert_eq!(q.volume, 15);
    }
}
