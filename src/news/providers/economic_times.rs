// src/news/providers/economic_times.rs
use async_trait::async_trait;
use tracing::warn;

use super::{feed_client, head_probe};
use crate::news::rss;
use crate::news::types::{NewsProvider, RawNewsArticle};

const PROVIDER: &str = "Economic Times";

const FEED_URLS: &[&str] = &[
    "https://economictimes.indiatimes.com/markets/rssfeeds/1977021501.cms",
    "https://economictimes.indiatimes.com/news/economy/rssfeeds/1373380680.cms",
];

/// The ET feeds mix market news with general-interest stories, so this
/// provider filters down to market-relevant items before returning.
const RELEVANCE_KEYWORDS: &[&str] = &[
    "nifty",
    "sensex",
    "market",
    "stock",
    "share",
    "equity",
    "rbi",
    "policy",
    "rate",
    "inflation",
    "gdp",
    "economy",
    "banking",
    "finance",
    "investment",
    "trading",
];

pub struct EconomicTimesProvider {
    http: reqwest::Client,
}

impl EconomicTimesProvider {
    pub fn new() -> Self {
        Self {
            http: feed_client(),
        }
    }
}

impl Default for EconomicTimesProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive substring match over headline + summary.
pub fn is_relevant(article: &RawNewsArticle) -> bool {
    let text = format!(
        "{} {}",
        article.headline,
        article.summary.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    RELEVANCE_KEYWORDS.iter().any(|kw| text.contains(kw))
}

#[async_trait]
impl NewsProvider for EconomicTimesProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn is_available(&self) -> bool {
        head_probe(&self.http, FEED_URLS[0]).await
    }

    async fn fetch_articles(&self) -> Vec<RawNewsArticle> {
        let mut all = Vec::new();
        for feed_url in FEED_URLS {
            match rss::fetch_feed(&self.http, feed_url, PROVIDER).await {
                Ok(mut articles) => all.append(&mut articles),
                Err(e) => warn!(provider = PROVIDER, url = feed_url, error = %e, "feed failed"),
            }
        }
        all.retain(is_relevant);
        all
    }
}
