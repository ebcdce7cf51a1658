// tests/ai_analysis.rs
use std::sync::Arc;

use async_trait::async_trait;
use marketpulse::ai::{
    build_prompt, parse_analysis, ArticleAnalysis, CompletionBackend, SentimentScorer,
};
use marketpulse::news::types::NewsCategory;

struct StaticBackend(&'static str);

#[async_trait]
impl CompletionBackend for StaticBackend {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("connection reset by peer")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

#[test]
fn analysis_is_extracted_exactly_from_surrounding_prose() {
    let text = "Sure, here: {\"sentiment\":0.5,\"category\":\"Policy\",\"rationale\":\"ok\",\"relevanceScore\":80}";
    let analysis = parse_analysis(text).unwrap();
    assert_eq!(
        analysis,
        ArticleAnalysis {
            sentiment: 0.5,
            category: NewsCategory::Policy,
            rationale: "ok".to_string(),
            relevance_score: 80.0,
        }
    );
}

#[test]
fn prompt_embeds_headline_and_requests_the_schema() {
    let prompt = build_prompt("RBI cuts rates", "Rates down");
    assert!(prompt.contains("RBI cuts rates"));
    assert!(prompt.contains("relevanceScore"));
    assert!(prompt.contains("Macro, Earnings, Policy, Technical"));
}

#[tokio::test]
async fn scorer_passes_through_valid_backend_output() {
    let scorer = SentimentScorer::new(Arc::new(StaticBackend(
        r#"{"sentiment":-0.3,"category":"Earnings","rationale":"weak guidance","relevanceScore":70}"#,
    )));
    let analysis = scorer.analyze("Company X warns", "guidance cut").await;
    assert_eq!(analysis.sentiment, -0.3);
    assert_eq!(analysis.category, NewsCategory::Earnings);
    assert_eq!(analysis.relevance_score, 70.0);
}

#[tokio::test]
async fn transport_failure_yields_the_neutral_default() {
    let scorer = SentimentScorer::new(Arc::new(FailingBackend));
    let analysis = scorer.analyze("Anything", "at all").await;
    assert_eq!(analysis, ArticleAnalysis::neutral("Unable to analyze"));
}

#[tokio::test]
async fn empty_response_yields_the_neutral_default() {
    let scorer = SentimentScorer::new(Arc::new(StaticBackend("")));
    let analysis = scorer.analyze("Anything", "at all").await;
    assert_eq!(analysis, ArticleAnalysis::neutral("Unable to analyze"));
}

#[tokio::test]
async fn disabled_scorer_reports_pending() {
    let scorer = SentimentScorer::disabled();
    assert_eq!(scorer.backend_name(), "disabled");
    let analysis = scorer.analyze("Anything", "at all").await;
    assert_eq!(analysis, ArticleAnalysis::neutral("Analysis pending"));
}
