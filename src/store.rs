use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{Document, category_of};

/// Aggregate counters over the stored documents.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreStats {
    pub total_documents: usize,
    pub categories: usize,
    pub category_list: Vec<String>,
}

#[derive(Debug, Default)]
struct StoreInner {
    documents: BTreeMap<String, Document>,
    categories: BTreeSet<String>,
}

/// Single source of truth for document state.
///
/// All mutation passes through here. The interior map and the derived
/// category set sit behind one mutex scoped to individual operations, so
/// concurrent adds and deletes stay atomic without serializing whole
/// request lifetimes. The store never computes embeddings; callers supply
/// them, keeping embedding policy outside.
///
/// Iteration order (for listing and candidate scans) is id order via the
/// underlying `BTreeMap`: stable within a process run, as the pipeline's
/// tie-breaking requires.
#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: Mutex<StoreInner>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    ///
    /// A replacement preserves the original `created_at` and stamps
    /// `updated_at`; a first insert stamps `created_at` and leaves
    /// `updated_at` unset. The category index picks up `metadata.category`
    /// incrementally.
    pub fn add(&self, mut document: Document) {
        let now = Utc::now();
        let mut inner = self.inner.lock();

        match inner.documents.get(&document.id) {
            Some(existing) => {
                document.created_at = existing.created_at;
                document.updated_at = Some(now);
            }
            None => {
                document.created_at = now;
                document.updated_at = None;
            }
        }

        if let Some(category) = category_of(&document.metadata) {
            inner.categories.insert(category);
        }

        debug!(id = %document.id, "storing document");
        inner.documents.insert(document.id.clone(), document);
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.inner.lock().documents.get(id).cloned()
    }

    /// Paginated listing in stable store order. An offset past the end
    /// yields an empty vec, never an error.
    pub fn list(&self, limit: usize, offset: usize) -> Vec<Document> {
        self.inner
            .lock()
            .documents
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Remove a document. Returns false when the id is unknown.
    ///
    /// The category index is not pruned: it tracks every category ever
    /// observed, so it may retain categories no live document holds.
    pub fn delete(&self, id: &str) -> bool {
        let removed = self.inner.lock().documents.remove(id).is_some();
        if removed {
            debug!(id = %id, "deleted document");
        }
        removed
    }

    /// Every candidate for a linear scan, in stable store order.
    pub fn snapshot(&self) -> Vec<Document> {
        self.inner.lock().documents.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().documents.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.lock();
        StoreStats {
            total_documents: inner.documents.len(),
            categories: inner.categories.len(),
            category_list: inner.categories.iter().cloned().collect(),
        }
    }
}
