use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ulid::Ulid;

use crate::{
    config::Config,
    document::{
        Document, DocumentUpdate, DocumentView, NewDocument, UNTITLED,
    },
    embedding::{Embedder, HashEmbedder},
    error::{Error, Result},
    history::{HistoryStats, PopularQuery, SearchHistory, SearchHistoryEntry},
    search::{SearchParams, SearchResponse, execute_search},
    store::{DocumentStore, StoreStats},
    versioning::{DocumentVersion, VersionManager},
};

/// Combined snapshot of store and history statistics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IndexStats {
    pub store: StoreStats,
    pub history: HistoryStats,
}

/// The index facade: one long-lived instance owning the embedder, document
/// store, version logs, and search history.
///
/// Transports hold a shared handle to one of these and call its methods
/// with parsed request structures; nothing here is process-global, so tests
/// construct isolated instances freely.
pub struct SemanticIndex {
    config: Config,
    embedder: Box<dyn Embedder>,
    store: DocumentStore,
    versions: VersionManager,
    history: SearchHistory,
}

impl SemanticIndex {
    /// Build an index using the deterministic hash embedder.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_embedder(config, Box::new(HashEmbedder))
    }

    /// Build an index around any embedder implementation.
    pub fn with_embedder(
        config: Config,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self> {
        config.validate_dimension(embedder.dimension())?;
        let history = SearchHistory::new(config.max_history);
        Ok(Self {
            config,
            embedder,
            store: DocumentStore::new(),
            versions: VersionManager::new(),
            history,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate, embed, and store a submitted document, recording its first
    /// (or next) content version. Returns the stored projection.
    pub fn index_document(&self, document: NewDocument) -> Result<DocumentView> {
        let content = document
            .content
            .ok_or_else(|| Error::Validation("content is required".to_string()))?;
        self.check_content_size(&content)?;

        let id = document.id.unwrap_or_else(|| Ulid::new().to_string());
        let title = document.title.unwrap_or_else(|| UNTITLED.to_string());
        let metadata = document.metadata.unwrap_or_default();
        let embedding = self.embedder.embed(&content);

        self.store.add(Document {
            id: id.clone(),
            title,
            content: content.clone(),
            embedding,
            metadata,
            created_at: chrono::Utc::now(),
            updated_at: None,
        });
        let version = self.versions.create_version(&id, &content);
        info!(id = %id, version = version.version, "indexed document");

        self.fetch_view(&id)
    }

    pub fn get_document(&self, id: &str) -> Result<DocumentView> {
        self.store
            .get(id)
            .map(|doc| DocumentView::from(&doc))
            .ok_or_else(|| Error::NotFound {
                kind: "document",
                name: id.to_string(),
            })
    }

    /// Shallow-merge `update` over an existing document. A provided content
    /// field is re-embedded and versioned, so the stored fingerprint is
    /// never stale; a missing target is a defined not-found, not a create.
    pub fn update_document(
        &self,
        id: &str,
        update: DocumentUpdate,
    ) -> Result<DocumentView> {
        let mut doc = self.store.get(id).ok_or_else(|| Error::NotFound {
            kind: "document",
            name: id.to_string(),
        })?;

        if let Some(title) = update.title {
            doc.title = title;
        }
        if let Some(metadata) = update.metadata {
            doc.metadata = metadata;
        }
        let new_content = update.content.clone();
        if let Some(content) = new_content {
            self.check_content_size(&content)?;
            doc.embedding = self.embedder.embed(&content);
            doc.content = content;
        }

        self.store.add(doc);
        if let Some(content) = update.content {
            let version = self.versions.create_version(id, &content);
            debug!(id = %id, version = version.version, "versioned update");
        }

        self.fetch_view(id)
    }

    /// Remove a document. Returns false for unknown ids; version history is
    /// retained either way.
    pub fn delete_document(&self, id: &str) -> bool {
        self.store.delete(id)
    }

    pub fn list_documents(&self, limit: usize, offset: usize) -> Vec<DocumentView> {
        self.store
            .list(limit, offset)
            .iter()
            .map(DocumentView::from)
            .collect()
    }

    /// Run the search pipeline and record the query in history.
    pub fn search(&self, params: &SearchParams) -> Result<SearchResponse> {
        let response =
            execute_search(params, &self.store, self.embedder.as_ref(), &self.config)?;
        self.history.add_search(
            &params.query,
            response.total_results,
            params.filters.clone(),
        );
        Ok(response)
    }

    pub fn versions(&self, doc_id: &str) -> Vec<DocumentVersion> {
        self.versions.get_versions(doc_id)
    }

    pub fn version(&self, doc_id: &str, n: u32) -> Result<DocumentVersion> {
        self.versions
            .get_version(doc_id, n)
            .ok_or_else(|| Error::NotFound {
                kind: "version",
                name: format!("{doc_id}@{n}"),
            })
    }

    pub fn latest_version(&self, doc_id: &str) -> Option<DocumentVersion> {
        self.versions.get_latest_version(doc_id)
    }

    pub fn recent_searches(&self, limit: usize) -> Vec<SearchHistoryEntry> {
        self.history.get_recent_searches(limit)
    }

    pub fn popular_queries(&self, limit: usize) -> Vec<PopularQuery> {
        self.history.get_popular_queries(limit)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            store: self.store.stats(),
            history: self.history.get_history_stats(),
        }
    }

    fn check_content_size(&self, content: &str) -> Result<()> {
        if content.len() > self.config.max_document_size {
            return Err(Error::Validation(format!(
                "content exceeds maximum document size of {} bytes",
                self.config.max_document_size
            )));
        }
        Ok(())
    }

    fn fetch_view(&self, id: &str) -> Result<DocumentView> {
        self.store
            .get(id)
            .map(|doc| DocumentView::from(&doc))
            .ok_or_else(|| {
                Error::Internal(format!("document {id} missing after write"))
            })
    }
}
