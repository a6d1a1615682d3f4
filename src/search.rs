use chrono::Utc;
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    document::{Metadata, metadata_matches},
    embedding::Embedder,
    error::{Error, Result},
    ranking::{self, RankedDocument},
    similarity::cosine_similarity,
    store::DocumentStore,
    text_util::truncate_for_display,
};

/// A parsed search request.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: String,
    /// Exact-match metadata filters, AND semantics across keys.
    pub filters: Metadata,
    /// Result count; the configured default applies when unset.
    pub top_k: Option<usize>,
    /// Enables the lexical rerank stage with its own (usually smaller)
    /// result count.
    pub rerank: Option<usize>,
    /// Enables the time-decay stage with the given decay factor.
    pub time_decay: Option<f32>,
}

/// One search result as exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHit {
    pub document_id: String,
    pub title: String,
    /// At most 200 characters, with a marker when cut.
    pub content: String,
    /// Running relevance score, rounded to 4 decimal places.
    pub similarity_score: f32,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
    pub query: String,
    pub filters: Metadata,
    pub results: Vec<SearchHit>,
    pub total_results: usize,
}

/// Execute the full search pipeline.
///
/// 1. Embed the query
/// 2. Linear scan over every stored document (no index pruning)
/// 3. Drop candidates failing the metadata filters
/// 4. Cosine-score the survivors
/// 5. Drop scores below the configured threshold
/// 6. Stable sort descending (ties keep scan order)
/// 7. Optional lexical rerank, optional time decay
/// 8. Truncate to `top_k` and project
pub fn execute_search(
    params: &SearchParams,
    store: &DocumentStore,
    embedder: &dyn Embedder,
    config: &Config,
) -> Result<SearchResponse> {
    if params.query.trim().is_empty() {
        return Err(Error::Validation("query is required".to_string()));
    }

    let query_embedding = embedder.embed(&params.query);
    let candidates = store.snapshot();

    let mut results: Vec<RankedDocument> = candidates
        .par_iter()
        .filter(|doc| metadata_matches(&doc.metadata, &params.filters))
        .map(|doc| {
            let score = cosine_similarity(&query_embedding, &doc.embedding)?;
            Ok(RankedDocument {
                document_id: doc.id.clone(),
                title: doc.title.clone(),
                content: doc.content.clone(),
                score: round_score(score),
                metadata: doc.metadata.clone(),
                created_at: doc.created_at,
            })
        })
        .collect::<Result<_>>()?;

    results.retain(|r| r.score >= config.similarity_threshold);
    ranking::sort_by_score(&mut results);

    if let Some(rerank_top_k) = params.rerank {
        ranking::rerank_by_title(&mut results, &params.query, rerank_top_k);
    }
    if let Some(decay_factor) = params.time_decay {
        ranking::apply_time_decay(&mut results, decay_factor, Utc::now());
    }

    let top_k = params.top_k.unwrap_or(config.default_top_k);
    results.truncate(top_k);

    let hits: Vec<SearchHit> = results
        .into_iter()
        .map(|r| SearchHit {
            document_id: r.document_id,
            title: r.title,
            content: truncate_for_display(&r.content),
            similarity_score: round_score(r.score),
            metadata: r.metadata,
        })
        .collect();

    Ok(SearchResponse {
        query: params.query.clone(),
        filters: params.filters.clone(),
        total_results: hits.len(),
        results: hits,
    })
}

/// Round a running score to 4 decimal places for presentation and ordering.
fn round_score(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::{document::Document, embedding::HashEmbedder};

    fn add_doc(
        store: &DocumentStore,
        embedder: &HashEmbedder,
        id: &str,
        title: &str,
        content: &str,
        category: Option<&str>,
    ) {
        let mut metadata = Metadata::new();
        if let Some(category) = category {
            metadata.insert("category".to_string(), json!(category));
        }
        store.add(Document {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            embedding: embedder.embed(content),
            metadata,
            created_at: Utc::now(),
            updated_at: None,
        });
    }

    fn params(query: &str) -> SearchParams {
        SearchParams {
            query: query.to_string(),
            ..SearchParams::default()
        }
    }

    fn pet_fixture() -> (DocumentStore, HashEmbedder, Config) {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        add_doc(&store, &embedder, "cats", "Cats", "Cats are great pets", None);
        add_doc(
            &store,
            &embedder,
            "cars",
            "Cars",
            "Electric cars are efficient",
            None,
        );
        (store, embedder, Config::default())
    }

    #[test]
    fn empty_query_is_rejected_before_any_stage() {
        let (store, embedder, config) = pet_fixture();
        for query in ["", "   "] {
            let err = execute_search(&params(query), &store, &embedder, &config)
                .unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
    }

    #[test]
    fn top_k_one_returns_the_best_match() {
        let (store, embedder, config) = pet_fixture();
        let mut search = params("pets");
        search.top_k = Some(1);

        let response =
            execute_search(&search, &store, &embedder, &config).unwrap();
        assert_eq!(response.total_results, 1);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].document_id, "cats");
        // Deterministic given the fixed hash scheme.
        assert!((response.results[0].similarity_score - 0.7684).abs() < 1e-6);
    }

    #[test]
    fn results_are_sorted_descending() {
        let (store, embedder, config) = pet_fixture();
        let response =
            execute_search(&params("pets"), &store, &embedder, &config).unwrap();

        assert_eq!(response.total_results, 2);
        assert_eq!(response.results[0].document_id, "cats");
        assert_eq!(response.results[1].document_id, "cars");
        assert!(
            response.results[0].similarity_score
                > response.results[1].similarity_score
        );
        assert!((response.results[1].similarity_score - 0.6927).abs() < 1e-6);
    }

    #[test]
    fn metadata_filters_restrict_candidates() {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        add_doc(&store, &embedder, "d1", "One", "first body", Some("a"));
        add_doc(&store, &embedder, "d2", "Two", "second body", Some("b"));

        let mut search = params("body");
        search
            .filters
            .insert("category".to_string(), json!("a"));

        let response =
            execute_search(&search, &store, &embedder, &Config::default())
                .unwrap();
        assert_eq!(response.total_results, 1);
        assert_eq!(response.results[0].document_id, "d1");
    }

    #[test]
    fn identical_content_ties_break_by_scan_order() {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        add_doc(&store, &embedder, "b", "Second", "same words", None);
        add_doc(&store, &embedder, "a", "First", "same words", None);

        let response =
            execute_search(&params("query"), &store, &embedder, &Config::default())
                .unwrap();
        // Store order is id order, so "a" scans first.
        assert_eq!(response.results[0].document_id, "a");
        assert_eq!(
            response.results[0].similarity_score,
            response.results[1].similarity_score
        );
    }

    #[test]
    fn long_content_is_truncated_only_in_the_projection() {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        let long_content = "x".repeat(500);
        add_doc(&store, &embedder, "long", "Long", &long_content, None);

        let response =
            execute_search(&params("anything"), &store, &embedder, &Config::default())
                .unwrap();
        assert_eq!(response.results[0].content.chars().count(), 203);
        assert!(response.results[0].content.ends_with("..."));
        // Storage keeps the full content.
        assert_eq!(store.get("long").unwrap().content.len(), 500);
    }

    #[test]
    fn similarity_threshold_drops_low_scores() {
        let (store, embedder, mut config) = pet_fixture();
        config.similarity_threshold = 0.7;

        let response =
            execute_search(&params("pets"), &store, &embedder, &config).unwrap();
        assert_eq!(response.total_results, 1);
        assert_eq!(response.results[0].document_id, "cats");
    }

    #[test]
    fn rerank_stage_shrinks_to_its_own_top_k() {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        for i in 0..4 {
            add_doc(
                &store,
                &embedder,
                &format!("d{i}"),
                &format!("Title {i}"),
                &format!("content number {i}"),
                None,
            );
        }

        let mut search = params("content");
        search.rerank = Some(2);
        let response =
            execute_search(&search, &store, &embedder, &Config::default())
                .unwrap();
        assert_eq!(response.total_results, 2);
    }

    #[test]
    fn rerank_prefers_title_matches() {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        add_doc(&store, &embedder, "plain", "Unrelated", "alpha beta", None);
        add_doc(&store, &embedder, "titled", "Rust handbook", "gamma delta", None);

        let mut search = params("rust handbook");
        search.rerank = Some(5);
        let response =
            execute_search(&search, &store, &embedder, &Config::default())
                .unwrap();
        assert_eq!(response.results[0].document_id, "titled");
    }

    #[test]
    fn decay_stage_on_fresh_documents_keeps_order() {
        let (store, embedder, config) = pet_fixture();
        let mut search = params("pets");
        search.time_decay = Some(0.1);

        let response =
            execute_search(&search, &store, &embedder, &config).unwrap();
        // Both documents were created moments ago, so decay is ~1.0 and the
        // similarity order stands.
        assert_eq!(response.results[0].document_id, "cats");
    }

    #[test]
    fn corrupted_embedding_surfaces_an_internal_error() {
        let store = DocumentStore::new();
        let embedder = HashEmbedder;
        store.add(Document {
            id: "bad".to_string(),
            title: "Bad".to_string(),
            content: "body".to_string(),
            embedding: vec![0.5; 3],
            metadata: Metadata::new(),
            created_at: Utc::now(),
            updated_at: None,
        });

        let err =
            execute_search(&params("body"), &store, &embedder, &Config::default())
                .unwrap_err();
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn empty_store_yields_an_empty_response() {
        let store = DocumentStore::new();
        let response = execute_search(
            &params("anything"),
            &store,
            &HashEmbedder,
            &Config::default(),
        )
        .unwrap();
        assert_eq!(response.total_results, 0);
        assert!(response.results.is_empty());
    }
}
