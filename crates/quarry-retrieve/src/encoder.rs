//! Sparse encoder interface.
//!
//! The neural model that turns text into a sparse term-expansion vector
//! (SPLADE-style) is an external service: this crate defines only the seam.
//! Implementations wrap whatever inference backend the deployment uses;
//! tests use small deterministic stubs.
//!
//! Encoders are comparatively expensive, so the engine layer invokes
//! `encode` once per query and `encode_batch` during indexing.

use crate::sparse::SparseVector;
use std::fmt;

/// Error raised by a sparse encoder backend.
///
/// Encoder failures are recoverable at the query level: the hybrid engine
/// logs them and falls back to the lexical leg.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// The backend failed to produce output (model error, I/O, OOM, ...).
    Backend(String),
    /// The backend produced output the core cannot interpret.
    InvalidOutput(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Backend(msg) => write!(f, "Encoder backend error: {}", msg),
            EncodeError::InvalidOutput(msg) => write!(f, "Invalid encoder output: {}", msg),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Text to sparse-vector encoder.
///
/// Weights are positive reals produced by a learned model; the retrieval
/// core treats both term ids and weights as opaque. Implementations must be
/// shareable across threads: the engine scores queries concurrently.
pub trait SparseEncoder: Send + Sync {
    /// Encode one text into its sparse vector.
    fn encode(&self, text: &str) -> Result<SparseVector, EncodeError>;

    /// Encode a batch of texts.
    ///
    /// The default implementation loops over [`SparseEncoder::encode`];
    /// backends with real batch inference should override it.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>, EncodeError> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hashes each whitespace token to a term id with unit weight.
    struct HashEncoder;

    impl SparseEncoder for HashEncoder {
        fn encode(&self, text: &str) -> Result<SparseVector, EncodeError> {
            let mut pairs: Vec<(u32, f32)> = text
                .split_whitespace()
                .map(|token| (crc32fast::hash(token.as_bytes()) % 1000, 1.0))
                .collect();
            pairs.sort_unstable_by_key(|&(id, _)| id);
            pairs.dedup_by_key(|&mut (id, _)| id);
            SparseVector::from_pairs(pairs).map_err(|e| EncodeError::InvalidOutput(e.to_string()))
        }
    }

    #[test]
    fn test_default_encode_batch_loops() {
        let encoder = HashEncoder;
        let texts = vec!["alpha beta".to_string(), "gamma".to_string()];
        let batch = encoder.encode_batch(&texts).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], encoder.encode("alpha beta").unwrap());
        assert_eq!(batch[1], encoder.encode("gamma").unwrap());
    }
}
