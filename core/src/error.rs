use crate::index::DocId;
use thiserror::Error;

/// Failures surfaced by the engine.
///
/// `StoreUnavailable` is retryable; everything else signals bad input or a
/// broken internal invariant.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Ingestion supplied a document with a non-positive or duplicate id.
    /// The builder rejects the single document and keeps going.
    #[error("invalid document {doc_id}: {reason}")]
    InvalidDocument { doc_id: DocId, reason: &'static str },

    /// The backing key-value store could not be reached or returned garbage.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A doc id drawn from a postings list is missing from the document
    /// store. Postings only ever reference stored documents, so this is an
    /// internal invariant violation, not a caller mistake.
    #[error("document {doc_id} missing from store")]
    NotFound { doc_id: DocId },

    /// A guarded arithmetic path (IDF on an empty corpus or a zero document
    /// frequency) was reached with invalid inputs.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(&'static str),
}

impl From<sled::Error> for EngineError {
    fn from(err: sled::Error) -> Self {
        EngineError::StoreUnavailable(Box::new(err))
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::StoreUnavailable(err)
    }
}
