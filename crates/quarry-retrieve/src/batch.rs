//! Batch retrieval operations.
//!
//! Convenience helpers for scoring many queries against one index, one
//! result list per query.

use crate::bm25::{Bm25Params, PositionalIndex};
use crate::sparse::{SparseIndex, SparseVector};

/// Retrieve top-k documents for multiple free-text queries using BM25.
///
/// # Example
///
/// ```rust
/// use quarry_retrieve::batch::batch_search_bm25;
/// use quarry_retrieve::bm25::{Bm25Params, IndexBuilder};
///
/// let mut builder = IndexBuilder::new();
/// builder.add_document("0", "machine learning");
/// let index = builder.finalize();
///
/// let queries = vec!["machine".to_string(), "learning".to_string()];
/// let results = batch_search_bm25(&index, &queries, 10, Bm25Params::default());
/// assert_eq!(results.len(), 2);
/// ```
pub fn batch_search_bm25(
    index: &PositionalIndex,
    queries: &[String],
    k: usize,
    params: Bm25Params,
) -> Vec<Vec<(String, f32)>> {
    queries
        .iter()
        .map(|query| index.search(query, k, params))
        .collect()
}

/// Retrieve top-k documents for multiple sparse query vectors.
pub fn batch_search_sparse(
    index: &SparseIndex,
    queries: &[SparseVector],
    k: usize,
) -> Vec<Vec<(String, f32)>> {
    queries
        .iter()
        .map(|query| index.search(query, k))
        .collect()
}
