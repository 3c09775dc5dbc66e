//! Sparse vector representation and operations.
//!
//! Sparse vectors use parallel arrays of indices and values, where indices
//! are sorted, unique term ids in the encoder's vocabulary and values are
//! positive term weights. Most coordinates of the underlying vocabulary-sized
//! vector are zero, so only the active pairs are stored.

use crate::RetrieveError;
use serde::{Deserialize, Serialize};

/// A sparse vector as parallel arrays of sorted, unique term indices and
/// their weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Create a sparse vector from sorted indices and matching values.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::InvalidSparseVector`] if the arrays disagree
    /// in length or the indices are not strictly ascending.
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> Result<Self, RetrieveError> {
        if indices.len() != values.len() {
            return Err(RetrieveError::InvalidSparseVector(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }

        for i in 1..indices.len() {
            if indices[i] <= indices[i - 1] {
                return Err(RetrieveError::InvalidSparseVector(format!(
                    "indices not strictly ascending at position {}",
                    i
                )));
            }
        }

        Ok(Self { indices, values })
    }

    /// Create a sparse vector from unordered `(term_id, weight)` pairs.
    ///
    /// Pairs are sorted by term id; duplicate term ids are rejected.
    pub fn from_pairs(pairs: Vec<(u32, f32)>) -> Result<Self, RetrieveError> {
        let mut pairs = pairs;
        pairs.sort_unstable_by_key(|&(term_id, _)| term_id);

        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(RetrieveError::InvalidSparseVector(format!(
                    "duplicate term id {}",
                    window[0].0
                )));
            }
        }

        let (indices, values) = pairs.into_iter().unzip();
        Ok(Self { indices, values })
    }

    /// Create a sparse vector without validation.
    ///
    /// The caller must ensure `indices.len() == values.len()` and that
    /// indices are strictly ascending.
    pub fn new_unchecked(indices: Vec<u32>, values: Vec<f32>) -> Self {
        Self { indices, values }
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// True when the vector has no active terms.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Compute the dot product between two sparse vectors.
///
/// Two-pointer merge over the sorted index arrays, O(|a| + |b|).
pub fn dot_product(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut i = 0;
    let mut j = 0;
    let mut result = 0.0;

    while i < a.indices.len() && j < b.indices.len() {
        if a.indices[i] < b.indices[j] {
            i += 1;
        } else if a.indices[i] > b.indices[j] {
            j += 1;
        } else {
            result += a.values[i] * b.values[j];
            i += 1;
            j += 1;
        }
    }

    result
}
