pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy exposed to transport layers.
///
/// Validation and not-found errors carry caller-facing detail; internal
/// errors are surfaced with a generic message while the full detail is
/// logged server-side. Per-item batch failures are plain data (see
/// [`crate::batch`]) and are collected, never raised.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Machine-readable kind for status-code mapping at the boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Validation(_) => "validation",
            Error::NotFound { .. } => "not_found",
            Error::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_includes_kind_and_name() {
        let err = Error::NotFound {
            kind: "document",
            name: "abc123".to_string(),
        };
        assert_eq!(err.to_string(), "document not found: abc123");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn validation_kind() {
        let err = Error::Validation("content is required".to_string());
        assert_eq!(err.kind(), "validation");
    }
}
