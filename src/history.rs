use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Metadata;

/// One recorded search.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub results_count: usize,
    pub filters: Metadata,
    pub timestamp: DateTime<Utc>,
}

/// A query grouped by exact string, with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PopularQuery {
    pub query: String,
    pub count: usize,
}

/// Aggregate statistics over the retained history window.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryStats {
    pub total_searches: usize,
    pub unique_queries: usize,
    pub average_results: f64,
}

/// Bounded FIFO log of past queries, independent of document lifecycle.
///
/// Once `max_history` entries are retained, each insertion evicts the
/// oldest entry first.
#[derive(Debug)]
pub struct SearchHistory {
    max_history: usize,
    entries: Mutex<VecDeque<SearchHistoryEntry>>,
}

impl SearchHistory {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn add_search(
        &self,
        query: &str,
        results_count: usize,
        filters: Metadata,
    ) {
        let mut entries = self.entries.lock();
        entries.push_back(SearchHistoryEntry {
            query: query.to_string(),
            results_count,
            filters,
            timestamp: Utc::now(),
        });
        while entries.len() > self.max_history {
            entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// The last `limit` searches in chronological order.
    pub fn get_recent_searches(&self, limit: usize) -> Vec<SearchHistoryEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    /// The `limit` most frequent query strings, descending by count. Ties
    /// keep first-seen order, so the output is deterministic.
    pub fn get_popular_queries(&self, limit: usize) -> Vec<PopularQuery> {
        let entries = self.entries.lock();

        let mut counts: Vec<PopularQuery> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for entry in entries.iter() {
            match index.get(&entry.query) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(entry.query.clone(), counts.len());
                    counts.push(PopularQuery {
                        query: entry.query.clone(),
                        count: 1,
                    });
                }
            }
        }

        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(limit);
        counts
    }

    pub fn get_history_stats(&self) -> HistoryStats {
        let entries = self.entries.lock();

        let unique_queries = entries
            .iter()
            .map(|e| e.query.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();
        let average_results = if entries.is_empty() {
            0.0
        } else {
            let total: usize = entries.iter().map(|e| e.results_count).sum();
            total as f64 / entries.len() as f64
        };

        HistoryStats {
            total_searches: entries.len(),
            unique_queries,
            average_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(queries: &[&str]) -> SearchHistory {
        let history = SearchHistory::new(100);
        for query in queries {
            history.add_search(query, 1, Metadata::new());
        }
        history
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let history = SearchHistory::new(3);
        for i in 0..5 {
            history.add_search(&format!("q{i}"), 0, Metadata::new());
        }

        assert_eq!(history.len(), 3);
        let retained: Vec<String> = history
            .get_recent_searches(10)
            .into_iter()
            .map(|e| e.query)
            .collect();
        assert_eq!(retained, vec!["q2", "q3", "q4"]);
    }

    #[test]
    fn recent_searches_are_chronological() {
        let history = history_with(&["first", "second", "third"]);
        let recent: Vec<String> = history
            .get_recent_searches(2)
            .into_iter()
            .map(|e| e.query)
            .collect();
        assert_eq!(recent, vec!["second", "third"]);
    }

    #[test]
    fn popular_queries_rank_by_count() {
        let history =
            history_with(&["rust", "python", "rust", "go", "rust", "python"]);
        let popular = history.get_popular_queries(2);
        assert_eq!(
            popular,
            vec![
                PopularQuery { query: "rust".to_string(), count: 3 },
                PopularQuery { query: "python".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn popular_query_ties_keep_first_seen_order() {
        let history = history_with(&["beta", "alpha", "beta", "alpha"]);
        let popular = history.get_popular_queries(10);
        assert_eq!(
            popular,
            vec![
                PopularQuery { query: "beta".to_string(), count: 2 },
                PopularQuery { query: "alpha".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn stats_on_empty_history_avoid_division_by_zero() {
        let history = SearchHistory::new(100);
        let stats = history.get_history_stats();
        assert_eq!(stats.total_searches, 0);
        assert_eq!(stats.unique_queries, 0);
        assert_eq!(stats.average_results, 0.0);
    }

    #[test]
    fn stats_aggregate_counts_and_mean() {
        let history = SearchHistory::new(100);
        history.add_search("a", 2, Metadata::new());
        history.add_search("a", 4, Metadata::new());
        history.add_search("b", 0, Metadata::new());

        let stats = history.get_history_stats();
        assert_eq!(stats.total_searches, 3);
        assert_eq!(stats.unique_queries, 2);
        assert!((stats.average_results - 2.0).abs() < 1e-9);
    }

    #[test]
    fn filters_are_recorded_with_the_entry() {
        let history = SearchHistory::new(100);
        let mut filters = Metadata::new();
        filters.insert("category".to_string(), serde_json::json!("science"));
        history.add_search("query", 5, filters);

        let recent = history.get_recent_searches(1);
        assert_eq!(recent[0].results_count, 5);
        assert_eq!(
            recent[0].filters.get("category"),
            Some(&serde_json::json!("science"))
        );
    }
}
