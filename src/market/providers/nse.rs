// src/market/providers/nse.rs
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use serde_json::Value;

use super::{FETCH_TIMEOUT, PROBE_TIMEOUT};
use crate::error::MarketError;
use crate::market::types::{QuoteProvider, RawQuote};

const PROVIDER: &str = "NSE India";

/// Quote provider for the NSE equity-stock-indices endpoint. The site
/// refuses requests without browser-like headers, so the client carries
/// them on every call.
pub struct NseProvider {
    http: reqwest::Client,
    site_url: String,
    base_url: String,
}

impl NseProvider {
    pub fn new() -> Self {
        Self::with_urls("https://www.nseindia.com", "https://www.nseindia.com/api")
    }

    /// Point the provider at a different host (local stub in tests).
    pub fn with_urls(site_url: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            ),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nseindia.com"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            http,
            site_url: site_url.into(),
            base_url: base_url.into(),
        }
    }
}

impl Default for NseProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a numeric field under any of the given aliases. NSE serves some
/// fields as numbers and some as numeric strings depending on the index.
fn num(obj: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(v) = s.trim().replace(',', "").parse::<f64>() {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}

fn required(obj: &Value, keys: &[&str]) -> Result<f64, MarketError> {
    num(obj, keys).ok_or_else(|| {
        MarketError::fetch(PROVIDER, format!("missing field {:?} in NSE response", keys[0]))
    })
}

#[async_trait]
impl QuoteProvider for NseProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn is_available(&self) -> bool {
        match self
            .http
            .get(&self.site_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn fetch_quote(&self) -> Result<RawQuote, MarketError> {
        let url = format!("{}/equity-stockIndices?index=NIFTY%2050", self.base_url);
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
                format!("NSE API returned {status}"),
            ));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| MarketError::fetch(PROVIDER, e.to_string()))?;

        let entry = body
            .get("data")
            .and_then(|d| d.get(0))
            .ok_or_else(|| MarketError::fetch(PROVIDER, "invalid NSE response format"))?;

        Ok(RawQuote {
            symbol: "NIFTY 50".to_string(),
            price: required(entry, &["last", "lastPrice"])?,
            change: required(entry, &["change"])?,
            change_percent: required(entry, &["pChange", "perChange"])?,
            open: required(entry, &["open"])?,
            high: required(entry, &["dayHigh", "high"])?,
            low: required(entry, &["dayLow", "low"])?,
            previous_close: required(entry, &["previousClose"])?,
            volume: num(entry, &["totalTradedVolume"]).unwrap_or(0.0) as u64,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn num_accepts_numbers_strings_and_aliases() {
        let v = json!({"lastPrice": "25,012.50", "change": 12.5});
        assert_eq!(num(&v, &["last", "lastPrice"]), Some(25012.50));
        assert_eq!(num(&v, &["change"]), Some(12.5));
        assert_eq!(num(&v, &["missing"]), None);
    }
}
