// src/market/providers/mod.rs
pub mod nse;
pub mod yahoo;

use std::time::Duration;

pub use nse::NseProvider;
pub use yahoo::YahooFinanceProvider;

/// Liveness probes must answer fast or not at all.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// Quote fetches get a little longer before they count as failed.
pub(crate) const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
