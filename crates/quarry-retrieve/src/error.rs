//! Error types for quarry-retrieve.

use std::fmt;

/// Errors that can occur while building retrieval structures.
///
/// Scoring never produces these: degenerate queries (empty text, no known
/// terms) return empty result lists instead of errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrieveError {
    /// Invalid sparse vector (mismatched arrays, unsorted or duplicate term ids).
    InvalidSparseVector(String),
    /// Batch arrays passed to `add_batch` disagree in length.
    BatchShapeMismatch {
        doc_ids: usize,
        indices: usize,
        values: usize,
    },
}

impl fmt::Display for RetrieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrieveError::InvalidSparseVector(msg) => {
                write!(f, "Invalid sparse vector: {}", msg)
            }
            RetrieveError::BatchShapeMismatch {
                doc_ids,
                indices,
                values,
            } => {
                write!(
                    f,
                    "Batch shape mismatch: {} doc ids, {} index arrays, {} value arrays",
                    doc_ids, indices, values
                )
            }
        }
    }
}

impl std::error::Error for RetrieveError {}
