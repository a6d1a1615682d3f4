use crate::{
    embedding::EMBEDDING_DIMENSION,
    error::{Error, Result},
};

/// Resolved runtime configuration.
///
/// Every tunable is environment-variable driven with a built-in default, so
/// a bare `Config::from_env()` always succeeds on an empty environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum accepted document content size in bytes.
    pub max_document_size: usize,
    /// Result count when a search does not specify `top_k`.
    pub default_top_k: usize,
    /// Expected embedding vector length.
    pub embedding_dimension: usize,
    /// Results scoring below this are dropped before truncation.
    pub similarity_threshold: f32,
    /// Capacity of the bounded search history log.
    pub max_history: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_document_size: 100_000,
            default_top_k: 10,
            embedding_dimension: EMBEDDING_DIMENSION,
            similarity_threshold: 0.0,
            max_history: 100,
        }
    }
}

impl Config {
    /// Resolve configuration from `EMBEDEX_*` environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-malformed values are
    /// rejected rather than silently ignored.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        Ok(Self {
            max_document_size: env_parse(
                "EMBEDEX_MAX_DOCUMENT_SIZE",
                defaults.max_document_size,
            )?,
            default_top_k: env_parse(
                "EMBEDEX_DEFAULT_TOP_K",
                defaults.default_top_k,
            )?,
            embedding_dimension: env_parse(
                "EMBEDEX_EMBEDDING_DIMENSION",
                defaults.embedding_dimension,
            )?,
            similarity_threshold: env_parse(
                "EMBEDEX_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            )?,
            max_history: env_parse("EMBEDEX_MAX_HISTORY", defaults.max_history)?,
        })
    }

    /// Check the configuration against the embedder actually in use.
    ///
    /// The dimension is configurable so a replacement embedder can declare
    /// its own, but a mismatch with the active one is a setup error.
    pub fn validate_dimension(&self, embedder_dimension: usize) -> Result<()> {
        if self.embedding_dimension != embedder_dimension {
            return Err(Error::Validation(format!(
                "configured embedding dimension {} does not match embedder dimension {}",
                self.embedding_dimension, embedder_dimension
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| {
            Error::Validation(format!("invalid value for {key}: {e}"))
        }),
        Err(_) => Ok(default),
    }
}
