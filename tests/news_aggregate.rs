// tests/news_aggregate.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use marketpulse::ai::{CompletionBackend, SentimentScorer};
use marketpulse::clock::ManualClock;
use marketpulse::config::Settings;
use marketpulse::news::types::{NewsCategory, NewsProvider, RawNewsArticle};
use marketpulse::news::NewsAggregationService;

fn article(headline: &str, day: u32, source: &str) -> RawNewsArticle {
    RawNewsArticle {
        headline: headline.to_string(),
        summary: Some(format!("{headline} summary")),
        url: format!("http://example.com/{source}/{day}"),
        published_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        source: source.to_string(),
    }
}

struct MockNews {
    name: &'static str,
    articles: Vec<RawNewsArticle>,
    fetch_calls: Arc<AtomicUsize>,
}

impl MockNews {
    fn new(name: &'static str, articles: Vec<RawNewsArticle>) -> Self {
        Self {
            name,
            articles,
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl NewsProvider for MockNews {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch_articles(&self) -> Vec<RawNewsArticle> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.articles.clone()
    }
}

/// Panics when polled, standing in for a provider whose task dies.
struct PanickingNews;

#[async_trait]
impl NewsProvider for PanickingNews {
    fn name(&self) -> &'static str {
        "Panicky"
    }
    async fn is_available(&self) -> bool {
        false
    }
    async fn fetch_articles(&self) -> Vec<RawNewsArticle> {
        panic!("feed parser blew up");
    }
}

struct CountingBackend {
    calls: Arc<AtomicUsize>,
    response: String,
}

#[async_trait]
impl CompletionBackend for CountingBackend {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

fn settings() -> Settings {
    let mut s = Settings::default();
    // Keep the pacing delay out of test wall time.
    s.ai_pacing_ms = 0;
    s
}

fn service(
    providers: Vec<Arc<dyn NewsProvider>>,
    scorer: SentimentScorer,
    clock: Arc<ManualClock>,
) -> NewsAggregationService {
    NewsAggregationService::with_providers(providers, scorer, &settings(), clock)
}

#[tokio::test]
async fn aggregates_flatten_dedup_and_sort_descending() {
    let et = MockNews::new(
        "ET",
        vec![
            article("RBI cuts rates", 1, "ET"),
            article("Sensex closes at record high", 3, "ET"),
        ],
    );
    let bs = MockNews::new(
        "BS",
        vec![
            // Exact normalized duplicate of the ET story.
            article("RBI cuts rates!", 2, "BS"),
            article("IT earnings beat street estimates", 4, "BS"),
        ],
    );

    let svc = service(
        vec![Arc::new(et), Arc::new(bs)],
        SentimentScorer::disabled(),
        Arc::new(ManualClock::new()),
    );
    let signals = svc.aggregate(false).await;

    assert_eq!(signals.len(), 3);
    // Newest first.
    assert_eq!(signals[0].article.headline, "IT earnings beat street estimates");
    assert_eq!(signals[1].article.headline, "Sensex closes at record high");
    // Join order across providers is unordered, so either spelling of the
    // duplicate may have won the first-seen scan; exactly one survives.
    assert!(signals[2].article.headline.starts_with("RBI cuts rates"));
}

#[tokio::test]
async fn fresh_cache_short_circuits_provider_calls() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let calls = Arc::clone(&p.fetch_calls);
    let clock = Arc::new(ManualClock::new());
    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::disabled(),
        Arc::clone(&clock),
    );

    let first = svc.aggregate(true).await;
    clock.advance(Duration::from_secs(60));
    let second = svc.aggregate(true).await;

    assert_eq!(first, second, "cached list is returned unchanged");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "no second network pass");
}

#[tokio::test]
async fn expired_cache_refetches() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let calls = Arc::clone(&p.fetch_calls);
    let clock = Arc::new(ManualClock::new());
    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::disabled(),
        Arc::clone(&clock),
    );

    svc.aggregate(true).await;
    clock.advance(Duration::from_secs(121));
    svc.aggregate(true).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_cache_is_not_a_cache_hit() {
    let p = MockNews::new("ET", vec![]);
    let calls = Arc::clone(&p.fetch_calls);
    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::disabled(),
        Arc::new(ManualClock::new()),
    );

    assert!(svc.aggregate(true).await.is_empty());
    assert!(svc.aggregate(true).await.is_empty());
    // An empty result is never cached, so both calls hit the provider.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panicking_provider_only_loses_its_own_articles() {
    let ok = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let svc = service(
        vec![Arc::new(PanickingNews), Arc::new(ok)],
        SentimentScorer::disabled(),
        Arc::new(ManualClock::new()),
    );

    let signals = svc.aggregate(false).await;
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].article.source, "ET");
}

#[tokio::test]
async fn only_top_20_articles_are_scored() {
    let many: Vec<RawNewsArticle> = (1..=28)
        .map(|day| article(&format!("Unique story number {day}"), day, "ET"))
        .collect();
    let p = MockNews::new("ET", many);

    let ai_calls = Arc::new(AtomicUsize::new(0));
    let backend = CountingBackend {
        calls: Arc::clone(&ai_calls),
        response: r#"{"sentiment":0.1,"category":"Macro","rationale":"ok","relevanceScore":60}"#
            .to_string(),
    };

    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::new(Arc::new(backend)),
        Arc::new(ManualClock::new()),
    );
    let signals = svc.aggregate(false).await;

    assert_eq!(signals.len(), 20);
    assert_eq!(ai_calls.load(Ordering::SeqCst), 20);
    // Truncation keeps the newest stories.
    assert_eq!(signals[0].article.headline, "Unique story number 28");
    assert_eq!(signals[19].article.headline, "Unique story number 9");
}

#[tokio::test]
async fn scored_fields_come_from_the_backend_json() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let backend = CountingBackend {
        calls: Arc::new(AtomicUsize::new(0)),
        response: concat!(
            "Sure, here: ",
            r#"{"sentiment":0.5,"category":"Policy","rationale":"ok","relevanceScore":80}"#
        )
        .to_string(),
    };

    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::new(Arc::new(backend)),
        Arc::new(ManualClock::new()),
    );
    let signals = svc.aggregate(false).await;

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].sentiment, 0.5);
    assert_eq!(signals[0].category, NewsCategory::Policy);
    assert_eq!(signals[0].rationale, "ok");
    assert_eq!(signals[0].relevance_score, 80.0);
}

#[tokio::test]
async fn unparseable_ai_response_degrades_to_neutral() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let backend = CountingBackend {
        calls: Arc::new(AtomicUsize::new(0)),
        response: "I cannot help with that.".to_string(),
    };

    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::new(Arc::new(backend)),
        Arc::new(ManualClock::new()),
    );
    let signals = svc.aggregate(false).await;

    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].sentiment, 0.0);
    assert_eq!(signals[0].category, NewsCategory::Macro);
    assert_eq!(signals[0].rationale, "Unable to analyze");
    assert_eq!(signals[0].relevance_score, 50.0);
}

#[tokio::test]
async fn disabled_scorer_marks_analysis_pending() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::disabled(),
        Arc::new(ManualClock::new()),
    );

    let signals = svc.aggregate(false).await;
    assert_eq!(signals[0].rationale, "Analysis pending");
    assert_eq!(signals[0].sentiment, 0.0);
}

#[tokio::test]
async fn clear_cache_forces_a_refetch() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let calls = Arc::clone(&p.fetch_calls);
    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::disabled(),
        Arc::new(ManualClock::new()),
    );

    svc.aggregate(true).await;
    svc.clear_cache();
    svc.aggregate(true).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// Verifies the ArticleAnalysis clamp invariant end to end.
#[tokio::test]
async fn out_of_range_backend_values_are_clamped() {
    let p = MockNews::new("ET", vec![article("RBI cuts rates", 1, "ET")]);
    let backend = CountingBackend {
        calls: Arc::new(AtomicUsize::new(0)),
        response: r#"{"sentiment":-7,"category":"Policy","rationale":"r","relevanceScore":900}"#
            .to_string(),
    };

    let svc = service(
        vec![Arc::new(p)],
        SentimentScorer::new(Arc::new(backend)),
        Arc::new(ManualClock::new()),
    );
    let signals = svc.aggregate(false).await;

    assert_eq!(signals[0].sentiment, -1.0);
    assert_eq!(signals[0].relevance_score, 100.0);
}
