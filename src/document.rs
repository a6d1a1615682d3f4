use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-schema document metadata: string keys mapped to arbitrary scalar
/// JSON values.
pub type Metadata = Map<String, Value>;

/// Title assigned when a submitted document carries none.
pub const UNTITLED: &str = "Untitled";

/// A stored document. The embedding is an internal representation and never
/// crosses the external boundary; callers receive a [`DocumentView`].
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A document submission as parsed by a transport layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NewDocument {
    /// Explicit id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Title; defaults to "Untitled".
    #[serde(default)]
    pub title: Option<String>,
    /// Document body. Required; its absence is a validation error.
    #[serde(default)]
    pub content: Option<String>,
    /// Open-schema metadata.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Fields to shallow-merge over an existing document. Each present field
/// replaces its counterpart wholesale; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DocumentUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.metadata.is_none()
    }
}

/// External projection of a [`Document`], with the embedding stripped.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Document> for DocumentView {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            content: doc.content.clone(),
            metadata: doc.metadata.clone(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Exact-match metadata filtering with AND semantics: a document matches
/// only if every filter key is present in its metadata with an equal value.
pub fn metadata_matches(metadata: &Metadata, filters: &Metadata) -> bool {
    filters
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

/// The `metadata.category` value tracked by the category index, if any.
pub fn category_of(metadata: &Metadata) -> Option<String> {
    metadata
        .get("category")
        .and_then(Value::as_str)
        .map(str::to_string)
}
