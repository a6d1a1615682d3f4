//! embedex - an in-memory semantic search engine.
//!
//! embedex stores text documents with a deterministic hash-derived
//! fingerprint and ranks them against queries by cosine similarity, with
//! optional lexical reranking and time decay. All state is process-lifetime
//! only; the embedder sits behind the [`Embedder`] trait so the placeholder
//! hash scheme can be swapped for a real model.
//!
//! # Quick start
//!
//! ```
//! use embedex::{Config, NewDocument, SemanticIndex};
//! use embedex::search::SearchParams;
//!
//! let index = SemanticIndex::new(Config::default()).unwrap();
//! index
//!     .index_document(NewDocument {
//!         title: Some("Cats".to_string()),
//!         content: Some("Cats are great pets".to_string()),
//!         ..NewDocument::default()
//!     })
//!     .unwrap();
//!
//! let response = index
//!     .search(&SearchParams {
//!         query: "pets".to_string(),
//!         ..SearchParams::default()
//!     })
//!     .unwrap();
//! assert_eq!(response.total_results, 1);
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod history;
pub mod index;
pub mod mcp;
pub mod ranking;
pub mod search;
pub mod similarity;
pub mod store;
pub mod text_util;
pub mod versioning;

pub use batch::BatchOperations;
pub use config::Config;
pub use document::{Document, DocumentUpdate, DocumentView, NewDocument};
pub use embedding::{EMBEDDING_DIMENSION, Embedder, HashEmbedder};
pub use error::{Error, Result};
pub use history::SearchHistory;
pub use index::SemanticIndex;
pub use search::{SearchHit, SearchParams, SearchResponse};
pub use store::DocumentStore;
pub use versioning::{DocumentVersion, VersionManager};
