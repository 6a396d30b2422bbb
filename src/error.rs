//! Error types for eateum-rag.

use std::time::Duration;
use thiserror::Error;

/// Library-level error type for recommendation, indexing and storage operations.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl RagError {
    /// Whether this error came from the similarity-search side of a request
    /// (as opposed to a bad request or local misconfiguration).
    pub fn is_retrieval(&self) -> bool {
        matches!(self, RagError::Retrieval(_) | RagError::Timeout(_))
    }
}

/// Result type alias for eateum-rag operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_classification() {
        assert!(RagError::Retrieval("down".into()).is_retrieval());
        assert!(RagError::Timeout(Duration::from_secs(3)).is_retrieval());
        assert!(!RagError::Ingest("bad".into()).is_retrieval());
        assert!(!RagError::Config("bad".into()).is_retrieval());
    }

    #[test]
    fn test_timeout_message() {
        let err = RagError::Timeout(Duration::from_secs(15));
        assert_eq!(err.to_string(), "Retrieval timed out after 15s");
    }
}
