// src/ai/mod.rs
//! AI sentiment scoring for news articles.
//!
//! The backend is any text-completion API that answers a prompt with free
//! text containing one JSON object. The analyzer owns prompt construction,
//! extraction of that object from surrounding prose, and validation of the
//! fields; every failure mode collapses to a neutral default so a bad model
//! response can never abort an aggregation batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::news::types::NewsCategory;

/// Validated analysis for one article. Ranges are enforced at parse time:
/// sentiment in [-1, 1], relevance in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAnalysis {
    pub sentiment: f64,
    pub category: NewsCategory,
    pub rationale: String,
    pub relevance_score: f64,
}

impl ArticleAnalysis {
    /// Fallback used whenever scoring fails or is disabled.
    pub fn neutral(rationale: &str) -> Self {
        Self {
            sentiment: 0.0,
            category: NewsCategory::Macro,
            rationale: rationale.to_string(),
            relevance_score: 50.0,
        }
    }
}

/// Low-level completion call, separated from the analyzer so tests can
/// substitute canned responses and count invocations.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
    fn name(&self) -> &'static str;
}

/// OpenAI chat-completions backend. Requires an API key; the model comes
/// from [`Settings`].
pub struct OpenAiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("marketpulse/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        if self.api_key.is_empty() {
            anyhow::bail!("no API key configured");
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
            max_tokens: 200,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("completion API returned {status}");
        }

        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            anyhow::bail!("empty completion");
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Turns one article into an [`ArticleAnalysis`], absorbing every failure.
pub struct SentimentScorer {
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl SentimentScorer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Scorer that always yields the neutral default.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        if settings.ai_enabled && !settings.ai_api_key.is_empty() {
            Self::new(Arc::new(OpenAiBackend::new(
                settings.ai_api_key.clone(),
                settings.ai_model.clone(),
            )))
        } else {
            Self::disabled()
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map(|b| b.name()).unwrap_or("disabled")
    }

    /// Score one article. Never errors; parse or transport failures yield
    /// the neutral default.
    pub async fn analyze(&self, headline: &str, summary: &str) -> ArticleAnalysis {
        let Some(backend) = &self.backend else {
            return ArticleAnalysis::neutral("Analysis pending");
        };

        let prompt = build_prompt(headline, summary);
        match backend.complete(&prompt).await {
            Ok(text) => match parse_analysis(&text) {
                Some(analysis) => analysis,
                None => {
                    warn!(backend = backend.name(), "no parseable JSON in AI response");
                    ArticleAnalysis::neutral("Unable to analyze")
                }
            },
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "AI completion failed");
                ArticleAnalysis::neutral("Unable to analyze")
            }
        }
    }
}

/// Fixed prompt template; the summary is capped at 200 chars to bound
/// token usage.
pub fn build_prompt(headline: &str, summary: &str) -> String {
    let summary: String = summary.chars().take(200).collect();
    format!(
        r#"Analyze this financial news for its 1-hour impact on Nifty 50.
Output ONLY valid JSON with this exact structure:
{{
  "sentiment": <number between -1.0 and 1.0>,
  "category": "<one of: Macro, Earnings, Policy, Technical>",
  "rationale": "<10 words max explaining the impact>",
  "relevanceScore": <number between 0 and 100 indicating relevance to Nifty 50>
}}

Headline: "{headline}"
Summary: "{summary}""#
    )
}

/// Find the first balanced top-level `{...}` block, skipping braces inside
/// JSON string literals. Models like to wrap their answer in prose.
pub fn extract_first_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Wire shape the model is asked to produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    sentiment: f64,
    category: String,
    rationale: String,
    relevance_score: f64,
}

/// Parse the model's free text into a validated analysis. Out-of-range
/// numbers are clamped; unknown categories fall back to Macro.
pub fn parse_analysis(text: &str) -> Option<ArticleAnalysis> {
    let json = extract_first_json(text)?;
    let raw: RawAnalysis = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "AI JSON did not match the requested schema");
            return None;
        }
    };

    if !raw.sentiment.is_finite() || !raw.relevance_score.is_finite() {
        return None;
    }

    Some(ArticleAnalysis {
        sentiment: raw.sentiment.clamp(-1.0, 1.0),
        category: NewsCategory::parse(&raw.category),
        rationale: raw.rationale,
        relevance_score: raw.relevance_score.clamp(0.0, 100.0),
    })
}
