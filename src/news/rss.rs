// src/news/rss.rs
//! Tolerant RSS fetching and parsing shared by all news providers.
//!
//! Outlet feeds are messy: bare HTML entities inside XML, CDATA-wrapped
//! titles, markup inside descriptions. Parsing therefore scrubs first,
//! deserializes with quick-xml, and strips HTML from the free-text fields;
//! items missing a title or link are dropped rather than failing the feed.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use tracing::warn;

use crate::error::NewsError;
use crate::news::types::RawNewsArticle;

/// Whole-feed download budget.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(10);

const SUMMARY_MAX_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Download one feed and parse it. The caller (a provider) decides whether
/// a failure here fails anything; by contract it never should.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    source_name: &str,
) -> Result<Vec<RawNewsArticle>, NewsError> {
    let resp = client
        .get(url)
        .timeout(FEED_TIMEOUT)
        .send()
        .await
        .map_err(|e| NewsError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(NewsError::Fetch {
            url: url.to_string(),
            reason: format!("RSS fetch failed: {status}"),
        });
    }

    let body = resp.text().await.map_err(|e| NewsError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(parse_feed(&body, source_name, Utc::now()))
}

/// Parse feed XML into articles. `fetched_at` substitutes for a missing or
/// unparseable pubDate.
pub fn parse_feed(xml: &str, source_name: &str, fetched_at: DateTime<Utc>) -> Vec<RawNewsArticle> {
    let t0 = std::time::Instant::now();
    let cleaned = scrub_html_entities_for_xml(xml);

    let rss: Rss = match from_str(&cleaned) {
        Ok(rss) => rss,
        Err(e) => {
            warn!(source = source_name, error = %e, "feed XML did not parse");
            return Vec::new();
        }
    };

    let mut out = Vec::with_capacity(rss.channel.items.len());
    for item in rss.channel.items {
        let Some(article) = article_from_item(item, source_name, fetched_at) else {
            continue;
        };
        out.push(article);
    }

    histogram!("news_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("news_articles_total").increment(out.len() as u64);
    out
}

fn article_from_item(
    item: Item,
    source_name: &str,
    fetched_at: DateTime<Utc>,
) -> Option<RawNewsArticle> {
    let headline = strip_html(item.title.as_deref().unwrap_or_default());
    let url = item.link.unwrap_or_default().trim().to_string();
    if headline.is_empty() || url.is_empty() {
        return None;
    }

    let summary = {
        let text = strip_html(item.description.as_deref().unwrap_or_default());
        if text.is_empty() {
            None
        } else {
            Some(text.chars().take(SUMMARY_MAX_CHARS).collect())
        }
    };

    Some(RawNewsArticle {
        headline,
        summary,
        url,
        published_at: item
            .pub_date
            .as_deref()
            .and_then(parse_pub_date)
            .unwrap_or(fetched_at),
        source: source_name.to_string(),
    })
}

/// RFC 2822 pubDate to UTC. Tries the `time` parser first, then chrono,
/// which accepts a few obsolete zone spellings the former rejects.
fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = OffsetDateTime::parse(ts.trim(), &Rfc2822) {
        let unix = dt.to_offset(UtcOffset::UTC).unix_timestamp();
        return Utc.timestamp_opt(unix, 0).single();
    }
    DateTime::parse_from_rfc2822(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Remove markup and entities from a free-text field and collapse the
/// whitespace left behind.
pub fn strip_html(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    let decoded = html_escape::decode_html_entities(s);
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let no_tags = re_tags.replace_all(&decoded, " ");
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&no_tags, " ").trim().to_string()
}

/// Feeds routinely embed HTML entities that are not legal XML entities;
/// replace the common offenders before strict parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
