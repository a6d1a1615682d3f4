use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    document::{DocumentUpdate, NewDocument},
    error::Error,
    index::SemanticIndex,
};

/// One update in a batch: the target id plus the fields to merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BatchUpdateItem {
    /// Target document id. Its absence is a per-item failure.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: DocumentUpdate,
}

/// A rejected batch item, echoed back with the failure reason.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchFailure<T> {
    pub item: T,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchIndexSummary {
    pub success: Vec<String>,
    pub failed: Vec<BatchFailure<NewDocument>>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchDeleteSummary {
    pub deleted: Vec<String>,
    pub not_found: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchUpdateSummary {
    pub updated: Vec<String>,
    pub failed: Vec<BatchFailure<BatchUpdateItem>>,
    pub total: usize,
}

/// Bulk operations over a [`SemanticIndex`] with per-item isolation: a
/// malformed item is recorded under `failed` and never aborts the rest.
///
/// Items run sequentially without cross-batch atomicity; concurrent
/// batches over the same ids race under last-write-wins.
pub struct BatchOperations<'a> {
    index: &'a SemanticIndex,
}

impl<'a> BatchOperations<'a> {
    pub fn new(index: &'a SemanticIndex) -> Self {
        Self { index }
    }

    /// Index every item, generating ids where absent. Each summary lists
    /// the ids indexed and the items rejected; `total` always equals the
    /// input size.
    pub fn batch_index(&self, documents: Vec<NewDocument>) -> BatchIndexSummary {
        let total = documents.len();
        let mut success = Vec::new();
        let mut failed = Vec::new();

        for document in documents {
            match self.index.index_document(document.clone()) {
                Ok(view) => success.push(view.id),
                Err(error) => {
                    debug!(%error, "batch index item rejected");
                    failed.push(BatchFailure {
                        item: document,
                        error: error.to_string(),
                    });
                }
            }
        }

        BatchIndexSummary { success, failed, total }
    }

    /// Partition ids into deleted and not-found. Missing ids are a defined
    /// outcome, never an error.
    pub fn batch_delete(&self, ids: &[String]) -> BatchDeleteSummary {
        let total = ids.len();
        let mut deleted = Vec::new();
        let mut not_found = Vec::new();

        for id in ids {
            if self.index.delete_document(id) {
                deleted.push(id.clone());
            } else {
                not_found.push(id.clone());
            }
        }

        BatchDeleteSummary { deleted, not_found, total }
    }

    /// Apply each update to its target document. An absent id or unknown
    /// target becomes a failure entry; updates never create documents.
    pub fn batch_update(&self, updates: Vec<BatchUpdateItem>) -> BatchUpdateSummary {
        let total = updates.len();
        let mut updated = Vec::new();
        let mut failed = Vec::new();

        for update in updates {
            let Some(id) = update.id.clone() else {
                failed.push(BatchFailure {
                    item: update,
                    error: Error::Validation("missing id".to_string())
                        .to_string(),
                });
                continue;
            };

            match self.index.update_document(&id, update.fields.clone()) {
                Ok(_) => updated.push(id),
                Err(error) => {
                    debug!(id = %id, %error, "batch update item rejected");
                    failed.push(BatchFailure {
                        item: update,
                        error: error.to_string(),
                    });
                }
            }
        }

        BatchUpdateSummary { updated, failed, total }
    }
}
