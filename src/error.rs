use std::time::Duration;

use thiserror::Error;

/// Failure to turn text into a vector.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Empty or whitespace-only input; rejected before any backend call.
    #[error("cannot embed empty input")]
    EmptyInput,
    /// The embedding backend returned an error or malformed response.
    #[error("embedding backend error: {0}")]
    Backend(String),
}

/// Failure inside a derived index structure.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// Persisted store contents could not be decoded.
    #[error("chunk store corrupt: {0}")]
    Corrupt(String),
}

/// Top-level error taxonomy for the retrieval core.
///
/// "No results" is never an error: queries against an empty corpus or with no
/// hit above the relevance floor return `Ok` with an empty list.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// An external call (embedding backend) exceeded its deadline. Distinct
    /// from an empty result so callers can tell a failure from "no match".
    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("no indexed chunks for {vendor}/{document}")]
    NotFound { vendor: String, document: String },

    #[error("chunk store I/O: {0}")]
    Store(#[from] std::io::Error),

    /// A search task could not be joined (spawn_blocking failure).
    #[error("search task failed: {0}")]
    Task(String),
}

/// Ingestion failure carrying the number of chunks already committed, so the
/// caller can decide whether to retry the remainder.
#[derive(Debug, Error)]
#[error("ingestion aborted after {written} chunks: {source}")]
pub struct IngestError {
    pub written: usize,
    #[source]
    pub source: RetrievalError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_reports_written_count() {
        let err = IngestError {
            written: 7,
            source: RetrievalError::Timeout(Duration::from_secs(30)),
        };
        let msg = err.to_string();
        assert!(msg.contains("7 chunks"), "unexpected message: {msg}");
    }

    #[test]
    fn test_not_found_names_vendor_and_document() {
        let err = RetrievalError::NotFound {
            vendor: "Fortinet".to_string(),
            document: "FortiOS_Handbook.pdf".to_string(),
        };
        assert!(err.to_string().contains("Fortinet/FortiOS_Handbook.pdf"));
    }
}
