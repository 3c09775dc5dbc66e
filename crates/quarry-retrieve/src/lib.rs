//! First-stage retrieval for the quarry search engine.
//!
//! This crate provides the two retrieval legs of a hybrid document search
//! system plus everything they share:
//!
//! - **Tokenization** ([`tokenize`]): the normalize / stopword / stem
//!   pipeline used identically at index build time and query time.
//! - **Lexical retrieval** ([`bm25`]): a positional inverted index with
//!   corpus statistics and Okapi BM25 scoring.
//! - **Learned sparse retrieval** ([`sparse`]): a transpose index over
//!   encoder-produced term-expansion vectors, scored by dot product.
//! - **Encoder seam** ([`encoder`]): the trait an external sparse encoder
//!   implements; the model itself lives outside this crate.
//! - **Persistence** ([`persistence`]): versioned, checksummed on-disk
//!   formats for both index types.
//!
//! Rank fusion and engine orchestration live upstream in `quarry-fusion`
//! and `quarry`.
//!
//! # Build / serve phases
//!
//! Both index types follow the same life cycle: a mutable builder collects
//! documents, a one-way `finalize()`/`build()` transition yields a read-only
//! index, and `save`/`load` reproduce either side of that transition in a
//! fresh process. The read-only types have no mutating methods, so a served
//! index is safe for concurrent readers by construction.
//!
//! # Quick Start
//!
//! ```rust
//! use quarry_retrieve::prelude::*;
//!
//! let mut builder = IndexBuilder::new();
//! builder.add_document("d1", "the quick brown fox");
//! builder.add_document("d2", "the lazy dog");
//! let index = builder.finalize();
//!
//! let results = index.search("quick fox", 10, Bm25Params::default());
//! assert_eq!(results[0].0, "d1");
//! ```

/// Text tokenization pipeline shared by index build and query paths.
pub mod tokenize;

/// Positional inverted index and Okapi BM25 scoring.
pub mod bm25;

/// Learned sparse retrieval (transpose index, dot-product scoring).
pub mod sparse;

/// Sparse encoder interface (implemented by external backends).
pub mod encoder;

/// Batch retrieval operations.
pub mod batch;

/// Versioned on-disk formats for persisted indices.
pub mod persistence;

/// Error types for retrieval operations.
pub mod error;

pub use error::RetrieveError;

/// Retrieve top-k documents for a free-text query using BM25.
///
/// Concrete-function form of [`bm25::PositionalIndex::search`], matching the
/// calling convention of the engine layer.
pub fn search_bm25(
    index: &bm25::PositionalIndex,
    query: &str,
    k: usize,
    params: bm25::Bm25Params,
) -> Vec<(String, f32)> {
    index.search(query, k, params)
}

/// Retrieve top-k documents for an encoded sparse query vector.
pub fn search_sparse(
    index: &sparse::SparseIndex,
    query: &sparse::SparseVector,
    k: usize,
) -> Vec<(String, f32)> {
    index.search(query, k)
}

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::bm25::{Bm25Params, IndexBuilder, PositionalIndex};
    pub use crate::encoder::{EncodeError, SparseEncoder};
    pub use crate::error::RetrieveError;
    pub use crate::persistence::{PersistenceError, PersistenceResult};
    pub use crate::sparse::{dot_product, SparseIndex, SparseIndexBuilder, SparseVector};
    pub use crate::tokenize::{Tokenizer, TokenizerConfig};
    pub use crate::{search_bm25, search_sparse};
}
