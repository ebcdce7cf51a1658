// src/news/dedup.rs
//! Near-duplicate headline elimination.
//!
//! The same story arrives from several outlets with lightly reworded
//! headlines. Dedup runs two passes per incoming article: an exact match
//! against normalized headlines already seen, then a Jaccard word-set
//! comparison against every accepted article.
//!
//! Known quirk, kept on purpose: when a near-duplicate with an earlier
//! publish time replaces an accepted article, the seen-set still holds the
//! replaced headline and is not updated. A later exact copy of the
//! replaced headline therefore re-enters the similarity scan instead of
//! being dropped by the fast path. Tests pin this order of checks.

use std::collections::HashSet;

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::news::types::RawNewsArticle;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_headline(text: &str) -> String {
    static RE_PUNCT: OnceCell<Regex> = OnceCell::new();
    static RE_WS: OnceCell<Regex> = OnceCell::new();

    let lower = text.to_lowercase();
    let re_punct = RE_PUNCT.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    let no_punct = re_punct.replace_all(&lower, "");
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&no_punct, " ").trim().to_string()
}

/// Jaccard similarity of the two headlines' word sets.
fn similarity(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split(' ').filter(|w| !w.is_empty()).collect();
    let words_b: HashSet<&str> = b.split(' ').filter(|w| !w.is_empty()).collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// Drop near-duplicates, scanning in input order. When a duplicate carries
/// an earlier `published_at` than the accepted article it matches, it
/// replaces that article in place (earliest publish time wins as the
/// canonical record); it is never appended as a second entry.
pub fn deduplicate(articles: Vec<RawNewsArticle>) -> Vec<RawNewsArticle> {
    let mut accepted: Vec<RawNewsArticle> = Vec::new();
    let mut seen_headlines: HashSet<String> = HashSet::new();

    for article in articles {
        let normalized = normalize_headline(&article.headline);

        if seen_headlines.contains(&normalized) {
            continue;
        }

        let matched = accepted.iter().position(|existing| {
            similarity(&normalized, &normalize_headline(&existing.headline))
                > SIMILARITY_THRESHOLD
        });

        match matched {
            Some(i) => {
                // Near-duplicate: keep whichever record was published first.
                // The seen-set is intentionally not touched here (see module
                // docs).
                if article.published_at < accepted[i].published_at {
                    accepted[i] = article;
                }
            }
            None => {
                accepted.push(article);
                seen_headlines.insert(normalized);
            }
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_headline("  RBI  Cuts Rates, Again!  "),
            "rbi cuts rates again"
        );
    }

    #[test]
    fn similarity_is_jaccard_over_word_sets() {
        assert_eq!(similarity("a b c", "a b c"), 1.0);
        assert_eq!(similarity("a b", "c d"), 0.0);
        assert!((similarity("a b c d", "a b c e") - 0.6).abs() < 1e-12);
        assert_eq!(similarity("", ""), 0.0);
    }
}
