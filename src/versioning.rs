use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Metadata;

/// An immutable snapshot of a document's content at one point in its life.
///
/// `doc_id` is a back-reference by id, not a live handle: version logs
/// outlive document deletion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentVersion {
    pub doc_id: String,
    pub content: String,
    /// 1-based, strictly increasing per document with no gaps.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Append-only version logs keyed by document id.
#[derive(Debug, Default)]
pub struct VersionManager {
    versions: Mutex<HashMap<String, Vec<DocumentVersion>>>,
}

impl VersionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next version for `doc_id` and return it. The first
    /// version of a document is 1; existing versions are never rewritten.
    pub fn create_version(&self, doc_id: &str, content: &str) -> DocumentVersion {
        let mut versions = self.versions.lock();
        let log = versions.entry(doc_id.to_string()).or_default();
        let version = DocumentVersion {
            doc_id: doc_id.to_string(),
            content: content.to_string(),
            version: log.len() as u32 + 1,
            created_at: Utc::now(),
            metadata: None,
        };
        log.push(version.clone());
        version
    }

    /// All versions for a document, oldest first. Unknown ids yield an
    /// empty vec, not an error.
    pub fn get_versions(&self, doc_id: &str) -> Vec<DocumentVersion> {
        self.versions.lock().get(doc_id).cloned().unwrap_or_default()
    }

    pub fn get_latest_version(&self, doc_id: &str) -> Option<DocumentVersion> {
        self.versions
            .lock()
            .get(doc_id)
            .and_then(|log| log.last().cloned())
    }

    /// Fetch version `n` (1-indexed). Out-of-range is a defined miss.
    pub fn get_version(&self, doc_id: &str, n: u32) -> Option<DocumentVersion> {
        if n == 0 {
            return None;
        }
        self.versions
            .lock()
            .get(doc_id)
            .and_then(|log| log.get(n as usize - 1).cloned())
    }
}
