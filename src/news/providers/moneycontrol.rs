// src/news/providers/moneycontrol.rs
use async_trait::async_trait;
use tracing::warn;

use super::{feed_client, head_probe};
use crate::news::rss;
use crate::news::types::{NewsProvider, RawNewsArticle};

const PROVIDER: &str = "Moneycontrol";

const FEED_URLS: &[&str] = &[
    "https://www.moneycontrol.com/rss/marketreports.xml",
    "https://www.moneycontrol.com/rss/economy.xml",
];

pub struct MoneycontrolProvider {
    http: reqwest::Client,
}

impl MoneycontrolProvider {
    pub fn new() -> Self {
        Self {
            http: feed_client(),
        }
    }
}

impl Default for MoneycontrolProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsProvider for MoneycontrolProvider {
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
