// src/market/history.rs
//! Sampled historical price window.
//!
//! This is a demo dashboard: there is no stored candle history, so the
//! indicator inputs are a sampled series around the live price. Values are
//! approximations by design (see the crate docs), recomputed in full on
//! every fetch cycle.

use rand::Rng;

use super::indicators;
use super::types::TechnicalIndicators;

const HISTORY_LEN: usize = 100;
const BASE_JITTER: f64 = 200.0;
const MAX_SAMPLE_VOLUME: f64 = 1_000_000.0;

/// Price history seeded by the freshly fetched quote: `HISTORY_LEN` samples
/// jittered around the live price, with the live price itself appended as
/// the newest sample.
pub fn sampled_prices(current_price: f64) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    let mut prices = Vec::with_capacity(HISTORY_LEN + 1);
    for _ in 0..HISTORY_LEN {
        let jitter = (rng.gen::<f64>() - 0.5) * BASE_JITTER;
        prices.push(current_price + jitter);
    }
    prices.push(current_price);
    prices
}

/// Full indicator recompute over a fresh sampled window.
pub fn compute_indicators(current_price: f64) -> TechnicalIndicators {
    let prices = sampled_prices(current_price);

    let mut rng = rand::thread_rng();
    let volumes: Vec<f64> = prices
        .iter()
        .map(|_| rng.gen::<f64>() * MAX_SAMPLE_VOLUME)
        .collect();

    let vwap_window = 20.min(prices.len());
    let vwap_start = prices.len() - vwap_window;

    TechnicalIndicators {
        vwap: indicators::vwap(&prices[vwap_start..], &volumes[vwap_start..]),
        sma50: indicators::sma(&prices, 50),
        ema9: indicators::ema(&prices, 9),
        ema21: indicators::ema(&prices, 21),
        rsi: indicators::rsi(&prices, 14),
        macd: indicators::macd(&prices),
        // Simulated risk gauge in the 12..18 band.
        vix: 12.0 + rng.gen::<f64>() * 6.0,
    }
}
