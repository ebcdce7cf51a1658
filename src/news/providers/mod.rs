// src/news/providers/mod.rs
pub mod business_standard;
pub mod economic_times;
pub mod moneycontrol;

use std::time::Duration;

pub use business_standard::BusinessStandardProvider;
pub use economic_times::EconomicTimesProvider;
pub use moneycontrol::MoneycontrolProvider;

pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub(crate) fn feed_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; NewsAggregator/1.0)")
        .build()
        .unwrap_or_default()
}

/// HEAD the first feed URL; any failure (including timeout) means false.
pub(crate) async fn head_probe(client: &reqwest::Client, url: &str) -> bool {
    match client.head(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}
