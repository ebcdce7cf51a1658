// src/market/indicators.rs
//! Pure technical-indicator math over an ordered price series
//! (oldest first). All functions are total: degenerate inputs yield the
//! documented fallback values instead of NaN or panics.

use super::types::MacdResult;

/// Volume-weighted average price over the supplied window.
/// Falls back to the last price when volume data is unusable
/// (empty, mismatched lengths, or zero total volume), and to 0.0 when
/// there are no prices at all.
pub fn vwap(prices: &[f64], volumes: &[f64]) -> f64 {
    let last = prices.last().copied().unwrap_or(0.0);
    if prices.is_empty() || volumes.is_empty() || prices.len() != volumes.len() {
        return last;
    }

    let total_volume: f64 = volumes.iter().sum();
    if total_volume == 0.0 {
        return last;
    }

    let weighted: f64 = prices.iter().zip(volumes).map(|(p, v)| p * v).sum();
    weighted / total_volume
}

/// Arithmetic mean of the last `period` prices; with fewer samples than
/// `period`, the mean of everything available.
pub fn sma(prices: &[f64], period: usize) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    if prices.len() < period {
        return prices.iter().sum::<f64>() / prices.len() as f64;
    }
    let tail = &prices[prices.len() - period..];
    tail.iter().sum::<f64>() / period as f64
}

/// Exponential moving average: seeded with the SMA of the first `period`
/// samples, then the standard recurrence with k = 2/(period+1) applied
/// forward over the remainder.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    if prices.len() < period {
        return sma(prices, prices.len());
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut value = sma(&prices[..period], period);
    for price in &prices[period..] {
        value = price * k + value * (1.0 - k);
    }
    value
}

/// Relative Strength Index over `period` deltas. Returns the neutral 50
/// when there are not enough samples, and 100 when there are no losses
/// in the window.
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    if prices.len() < period + 1 {
        return 50.0;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &changes[changes.len() - period..];

    // Both averages divide by the full period, matching the classic
    // Cutler's-RSI style smoothing over a fixed window.
    let avg_gain: f64 = recent.iter().filter(|c| **c > 0.0).sum::<f64>() / period as f64;
    let avg_loss: f64 =
        recent.iter().filter(|c| **c < 0.0).map(|c| c.abs()).sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD(12, 26) with a 9-period signal line. Fewer than 26 samples yields
/// the all-zero result.
///
/// The signal line is built by recomputing the 12/26 EMA difference over
/// every prefix ending at index >= 26 and taking EMA(9) of that history.
/// This is the O(n^2) reference formulation; the series here is ~100
/// samples, so it stays cheap.
pub fn macd(prices: &[f64]) -> MacdResult {
    if prices.len() < 26 {
        return MacdResult::default();
    }

    let macd_line = ema(prices, 12) - ema(prices, 26);

    let mut macd_history = Vec::with_capacity(prices.len() - 26);
    for i in 26..prices.len() {
        let prefix = &prices[..=i];
        macd_history.push(ema(prefix, 12) - ema(prefix, 26));
    }

    let signal = ema(&macd_history, 9);
    MacdResult {
        macd: macd_line,
        signal,
        histogram: macd_line - signal,
    }
}
