use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::document::Metadata;

/// Boost added per query term found in a title during reranking.
const TITLE_BOOST_WEIGHT: f32 = 0.1;

/// Result count the rerank stage falls back to when none is given.
pub const DEFAULT_RERANK_TOP_K: usize = 5;

/// A scored candidate flowing through the ranking stages.
///
/// `score` is the running relevance value: it starts as the raw cosine
/// similarity (rounded for presentation) and each enabled stage adjusts it
/// in place before re-sorting.
#[derive(Debug, Clone)]
pub struct RankedDocument {
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub score: f32,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Stable descending sort by running score.
///
/// Stability matters: equal scores keep their scan order, which keeps
/// result ordering reproducible.
pub fn sort_by_score(results: &mut [RankedDocument]) {
    results.sort_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
    });
}

/// Lexical rerank: boost each result by 0.1 per query term (whitespace
/// split, case-insensitive) occurring in its title, re-sort, and shrink to
/// this stage's own `top_k`.
pub fn rerank_by_title(
    results: &mut Vec<RankedDocument>,
    query: &str,
    top_k: usize,
) {
    let terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    for result in results.iter_mut() {
        let title = result.title.to_lowercase();
        let hits = terms.iter().filter(|term| title.contains(*term)).count();
        result.score += TITLE_BOOST_WEIGHT * hits as f32;
    }

    sort_by_score(results);
    results.truncate(top_k);
}

/// Exponentially down-weight older documents: multiply each running score
/// by `exp(-decay_factor * age_in_days)` with age measured from the
/// document's creation to `now`, then re-sort.
pub fn apply_time_decay(
    results: &mut [RankedDocument],
    decay_factor: f32,
    now: DateTime<Utc>,
) {
    for result in results.iter_mut() {
        let age_days =
            (now - result.created_at).num_seconds() as f32 / 86_400.0;
        result.score *= (-decay_factor * age_days).exp();
    }
    sort_by_score(results);
}

/// Per-document multiplicative boosts. Ids absent from the map keep their
/// score (factor 1.0).
pub fn apply_boosts(
    results: &mut [RankedDocument],
    boosts: &HashMap<String, f32>,
) {
    for result in results.iter_mut() {
        if let Some(boost) = boosts.get(&result.document_id) {
            result.score *= boost;
        }
    }
    sort_by_score(results);
}
