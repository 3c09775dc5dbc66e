//! # quarry
//!
//! The unified entry point for the quarry hybrid search engine.
//!
//! This crate serves two purposes:
//! 1. **Facade**: Re-exports the stage crates (`quarry-retrieve`,
//!    `quarry-fusion`) into a single, consistent namespace.
//! 2. **Orchestrator**: Provides the [`SearchEngine`] that composes the
//!    stages into a complete search system, plus the corpus indexing driver
//!    and the CLI binary.
//!
//! # Quick Start
//!
//! ```rust
//! use quarry::prelude::*;
//!
//! let mut engine = SearchEngine::new(EngineConfig::default());
//! engine.build_index_from_docs(vec![
//!     ("d1".to_string(), "a cat chased the dog".to_string()),
//!     ("d2".to_string(), "birdwatching for beginners".to_string()),
//! ]);
//!
//! let results = engine.hybrid_search("cat", 10);
//! assert_eq!(results[0].0, "d1");
//! ```
//!
//! # Architecture
//!
//! The system is composed of two retrieval legs and a fusion stage:
//!
//! 1. **Lexical** (`quarry-retrieve::bm25`): positional inverted index,
//!    Okapi BM25 scoring. Text is tokenized by the shared pipeline
//!    (normalize, stopword, stem) at build and query time.
//! 2. **Learned sparse** (`quarry-retrieve::sparse`): transpose index of
//!    encoder-produced term-expansion vectors, dot-product scoring. The
//!    encoder itself is external, behind the `SparseEncoder` trait.
//! 3. **Fusion** (`quarry-fusion`): Reciprocal Rank Fusion of the two
//!    candidate lists; scale-free, so the legs' incomparable score
//!    magnitudes never need calibration.
//!
//! Either leg may be absent (artifact not built, encoder not warmed up) and
//! the engine degrades to the other.

/// Engine orchestration: hybrid search over the two retrieval legs.
pub mod engine;

/// Corpus input for the indexing driver.
pub mod corpus;

/// Titles artifact storage.
pub mod titles;

/// Re-exports of the stage crates.
pub mod retrieve {
    pub use quarry_retrieve::*;
}

pub mod fusion {
    pub use quarry_fusion::*;
}

pub use engine::{EngineConfig, EngineError, SearchEngine};

pub mod prelude {
    pub use crate::corpus::{load_expanded_corpus, CorpusDoc};
    pub use crate::engine::{EngineConfig, EngineError, SearchEngine};

    // Retrieval types (indices, tokenizer, encoder seam)
    pub use quarry_retrieve::prelude::*;

    // Fusion algorithms
    pub use quarry_fusion::{fuse, rrf, rrf_k, rrf_multi, rrf_multi_k, RrfConfig};
}
