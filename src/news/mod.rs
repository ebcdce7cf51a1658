// src/news/mod.rs
//! News pipeline: concurrent multi-outlet fetch, dedup, ranking, AI
//! scoring, TTL cache.

pub mod dedup;
pub mod providers;
pub mod rss;
pub mod types;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::ai::SentimentScorer;
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use types::{NewsProvider, ProcessedNewsSignal, RawNewsArticle};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_articles_total", "Articles parsed from feeds.");
        describe_counter!(
            "news_dedup_removed_total",
            "Articles removed as near-duplicates."
        );
        describe_counter!(
            "news_cache_hits_total",
            "Aggregations answered from the cache."
        );
        describe_counter!("news_scored_total", "Articles run through AI scoring.");
        describe_histogram!("news_parse_ms", "Feed parse time in milliseconds.");
    });
}

struct CacheSlot {
    signals: Vec<ProcessedNewsSignal>,
    fetched_at: Option<Instant>,
}

/// Fans out to every outlet, deduplicates and ranks the union, scores the
/// survivors one at a time through the AI backend, and caches the result
/// for a couple of minutes.
///
/// Aggregation never fails as a whole: dead providers contribute nothing
/// and unscoreable articles carry the neutral default analysis.
pub struct NewsAggregationService {
    providers: Vec<Arc<dyn NewsProvider>>,
    scorer: SentimentScorer,
    cache: Mutex<CacheSlot>,
    ttl: Duration,
    top_articles: usize,
    pacing: Duration,
    clock: Arc<dyn Clock>,
}

impl NewsAggregationService {
    /// Production wiring: the three outlet providers and settings-driven
    /// TTL / pacing / AI backend.
    pub fn new(settings: &Settings) -> Self {
        Self::with_providers(
            vec![
                Arc::new(providers::EconomicTimesProvider::new()),
                Arc::new(providers::MoneycontrolProvider::new()),
                Arc::new(providers::BusinessStandardProvider::new()),
            ],
            SentimentScorer::from_settings(settings),
            settings,
            Arc::new(SystemClock),
        )
    }

    pub fn with_providers(
        providers: Vec<Arc<dyn NewsProvider>>,
        scorer: SentimentScorer,
        settings: &Settings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            providers,
            scorer,
            cache: Mutex::new(CacheSlot {
                signals: Vec::new(),
                fetched_at: None,
            }),
            ttl: Duration::from_secs(settings.news_cache_ttl_secs),
            top_articles: settings.top_articles,
            pacing: Duration::from_millis(settings.ai_pacing_ms),
            clock,
        }
    }

    fn fresh_cached(&self) -> Option<Vec<ProcessedNewsSignal>> {
        let slot = self.cache.lock().expect("news cache mutex poisoned");
        let fetched_at = slot.fetched_at?;
        if slot.signals.is_empty() {
            return None;
        }
        if self.clock.now().duration_since(fetched_at) < self.ttl {
            Some(slot.signals.clone())
        } else {
            None
        }
    }

    /// Aggregate the latest signals, honoring the cache when `use_cache`
    /// is set. Worst case is an empty list, never an error.
    pub async fn aggregate(&self, use_cache: bool) -> Vec<ProcessedNewsSignal> {
        if use_cache {
            if let Some(cached) = self.fresh_cached() {
                debug!("returning cached news");
                counter!("news_cache_hits_total").increment(1);
                return cached;
            }
        }

        info!("fetching fresh news from all sources");
        let all_articles = self.fetch_all().await;
        let before = all_articles.len();

        let mut unique = dedup::deduplicate(all_articles);
        counter!("news_dedup_removed_total").increment((before - unique.len()) as u64);
        debug!(before, after = unique.len(), "deduplicated headlines");

        unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        unique.truncate(self.top_articles);

        let signals = self.score_articles(unique).await;

        let mut slot = self.cache.lock().expect("news cache mutex poisoned");
        slot.signals = signals.clone();
        slot.fetched_at = Some(self.clock.now());
        signals
    }

    /// Concurrent fan-out over all providers. A provider that fails (or
    /// panics) contributes an empty list.
    async fn fetch_all(&self) -> Vec<RawNewsArticle> {
        let mut set = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            set.spawn(async move {
                let name = provider.name();
                let articles = provider.fetch_articles().await;
                info!(provider = name, count = articles.len(), "fetched articles");
                articles
            });
        }

        let mut all = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(mut articles) => all.append(&mut articles),
                Err(e) => warn!(error = %e, "news provider task failed"),
            }
        }
        all
    }

    /// Score sequentially with a fixed pause between calls; the backend is
    /// rate limited and this batch is the only caller.
    async fn score_articles(&self, articles: Vec<RawNewsArticle>) -> Vec<ProcessedNewsSignal> {
        let total = articles.len();
        let mut processed = Vec::with_capacity(total);

        for (i, article) in articles.into_iter().enumerate() {
            let analysis = self
                .scorer
                .analyze(
                    &article.headline,
                    article.summary.as_deref().unwrap_or_default(),
                )
                .await;
            counter!("news_scored_total").increment(1);

            processed.push(ProcessedNewsSignal {
                article,
                sentiment: analysis.sentiment,
                category: analysis.category,
                rationale: analysis.rationale,
                relevance_score: analysis.relevance_score,
            });

            if i + 1 < total {
                tokio::time::sleep(self.pacing).await;
            }
        }

        processed
    }

    pub fn clear_cache(&self) {
        let mut slot = self.cache.lock().expect("news cache mutex poisoned");
        slot.signals.clear();
        slot.fetched_at = None;
    }
}
