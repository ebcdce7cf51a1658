// src/news/providers/business_standard.rs
use async_trait::async_trait;
use tracing::warn;

use super::{feed_client, head_probe};
use crate::news::rss;
use crate::news::types::{NewsProvider, RawNewsArticle};

const PROVIDER: &str = "Business Standard";

const FEED_URLS: &[&str] = &[
    "https://www.business-standard.com/rss/markets-106.rss",
    "https://www.business-standard.com/rss/finance-103.rss",
];

pub struct BusinessStandardProvider {
    http: reqwest::Client,
}

impl BusinessStandardProvider {
    pub fn new() -> Self {
        Self {
            http: feed_client(),
        }
    }
}

impl Default for BusinessStandardProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsProvider for BusinessStandardProvider {
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
        all
    }
}
