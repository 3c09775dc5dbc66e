//! Engine orchestration: hybrid search over the two retrieval legs.
//!
//! [`SearchEngine`] owns the positional index, the sparse index, the titles
//! map, and an optional sparse encoder, and wires them into the query flow:
//!
//! ```text
//! query ──┬── tokenize ── BM25 over positional index ──┐
//!         └── encode ──── dot product over sparse index ┴── RRF ── top-k
//! ```
//!
//! The two legs are independent and run under `rayon::join`; the fusion step
//! is the barrier. Each leg is isolated: a missing artifact, an absent
//! encoder, or a per-query encoder failure degrades the hybrid result to the
//! surviving leg instead of failing the call.
//!
//! # Lifetime
//!
//! The caller owns the engine handle; there is no process-global state.
//! Construction is cheap, `load` materializes the indices from disk, and
//! `warm_up` materializes the encoder when the caller decides to pay that
//! cost. Once loaded, every search method takes `&self` and the engine is
//! safe to share across concurrent readers; all mutators require `&mut self`.

use crate::corpus::CorpusDoc;
use crate::titles;
use quarry_fusion::RrfConfig;
use quarry_retrieve::bm25::{Bm25Params, IndexBuilder, PositionalIndex};
use quarry_retrieve::encoder::{EncodeError, SparseEncoder};
use quarry_retrieve::persistence::PersistenceError;
use quarry_retrieve::sparse::{SparseIndex, SparseIndexBuilder};
use quarry_retrieve::RetrieveError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Engine configuration: artifact locations and retrieval parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Positional index artifact.
    pub index_path: PathBuf,
    /// Sparse index directory.
    pub splade_index_path: PathBuf,
    /// Titles artifact.
    pub titles_path: PathBuf,

    /// BM25 term-frequency saturation. Default: 1.5.
    pub k1: f32,
    /// BM25 length normalization. Default: 0.75.
    pub b: f32,
    /// RRF smoothing constant. Default: 60.
    pub rrf_k: u32,
    /// Per-leg retrieval depth before fusion. Default: 2000.
    pub candidates_k: usize,
    /// Final result count. Default: 10.
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl EngineConfig {
    /// Configuration with all artifacts under one directory and default
    /// retrieval parameters.
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            index_path: dir.join("index.bin"),
            splade_index_path: dir.join("splade_index"),
            titles_path: dir.join("titles.bin"),
            k1: 1.5,
            b: 0.75,
            rrf_k: 60,
            candidates_k: 2000,
            top_k: 10,
        }
    }

    fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.k1,
            b: self.b,
        }
    }
}

/// Errors surfaced by engine operations.
///
/// Search methods never produce these for query content; they arise from
/// indexing, persistence, and explicit sparse-leg calls.
#[derive(Debug)]
pub enum EngineError {
    /// Persistence failure (corrupt artifact, I/O).
    Persistence(PersistenceError),
    /// Sparse encoder failure.
    Encode(EncodeError),
    /// Invalid retrieval input while building.
    Retrieve(RetrieveError),
    /// Corpus file could not be read or parsed.
    Corpus(String),
    /// Operation needs the sparse encoder but `warm_up` has not run.
    EncoderUnavailable,
    /// Operation needs an index that is neither built nor loaded.
    IndexUnavailable,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Persistence(e) => write!(f, "Persistence error: {}", e),
            EngineError::Encode(e) => write!(f, "Encoder error: {}", e),
            EngineError::Retrieve(e) => write!(f, "Retrieval error: {}", e),
            EngineError::Corpus(msg) => write!(f, "Corpus error: {}", msg),
            EngineError::EncoderUnavailable => {
                write!(f, "Sparse encoder not initialized; call warm_up first")
            }
            EngineError::IndexUnavailable => {
                write!(f, "Index not available; build or load it first")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Persistence(e) => Some(e),
            EngineError::Encode(e) => Some(e),
            EngineError::Retrieve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for EngineError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

impl From<EncodeError> for EngineError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<RetrieveError> for EngineError {
    fn from(e: RetrieveError) -> Self {
        Self::Retrieve(e)
    }
}

/// Hybrid search engine over a lexical and a learned sparse leg.
pub struct SearchEngine {
    config: EngineConfig,
    index: Option<PositionalIndex>,
    sparse: Option<SparseIndex>,
    encoder: Option<Box<dyn SparseEncoder>>,
    titles: HashMap<String, String>,
}

impl SearchEngine {
    /// Create an engine with nothing loaded. Cheap; pair with
    /// [`SearchEngine::load`] and/or the build methods.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            index: None,
            sparse: None,
            encoder: None,
            titles: HashMap::new(),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Materialize the sparse encoder.
    ///
    /// Encoders are expensive to construct, so `new` does not touch them;
    /// callers decide when to pay the cost. Idempotent: a second call leaves
    /// the existing encoder in place.
    pub fn warm_up<F>(&mut self, build: F) -> Result<(), EngineError>
    where
        F: FnOnce() -> Result<Box<dyn SparseEncoder>, EncodeError>,
    {
        if self.encoder.is_some() {
            return Ok(());
        }
        self.encoder = Some(build()?);
        tracing::info!("sparse encoder ready");
        Ok(())
    }

    /// Whether the sparse encoder has been materialized.
    pub fn encoder_ready(&self) -> bool {
        self.encoder.is_some()
    }

    /// Build the positional index from `(doc_id, text)` pairs, replacing any
    /// previously built or loaded lexical index.
    pub fn build_index_from_docs<I>(&mut self, docs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut builder = IndexBuilder::new();
        for (doc_id, text) in docs {
            builder.add_document(&doc_id, &text);
        }
        tracing::info!(documents = builder.doc_count(), "lexical index built");
        self.index = Some(builder.finalize());
    }

    /// Build the sparse index by encoding documents in batches.
    ///
    /// Requires a warmed-up encoder. A batch that fails to encode is logged
    /// and skipped; indexing continues with the remaining batches. Returns
    /// the number of documents indexed.
    pub fn index_sparse_from_docs(
        &mut self,
        docs: &[(String, String)],
        batch_size: usize,
    ) -> Result<usize, EngineError> {
        let encoder = self.encoder.as_ref().ok_or(EngineError::EncoderUnavailable)?;

        let mut builder = SparseIndexBuilder::new();
        for batch in docs.chunks(batch_size.max(1)) {
            let ids: Vec<String> = batch.iter().map(|(id, _)| id.clone()).collect();
            let texts: Vec<String> = batch.iter().map(|(_, text)| text.clone()).collect();

            let vectors = match encoder.encode_batch(&texts) {
                Ok(vectors) => vectors,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        batch_start = builder.doc_count(),
                        batch_len = ids.len(),
                        "sparse encoding failed; skipping batch"
                    );
                    continue;
                }
            };

            let (indices, values): (Vec<Vec<u32>>, Vec<Vec<f32>>) = vectors
                .into_iter()
                .map(|vector| (vector.indices, vector.values))
                .unzip();
            builder.add_batch(&ids, &indices, &values)?;
        }

        let indexed = builder.doc_count();
        tracing::info!(documents = indexed, "sparse index built");
        self.sparse = Some(builder.build());
        Ok(indexed)
    }

    /// Build both indices and the titles map from an enriched corpus.
    ///
    /// The lexical leg is always built; the sparse leg only when the encoder
    /// is ready.
    pub fn build_from_corpus(&mut self, docs: &[CorpusDoc], batch_size: usize) -> Result<(), EngineError> {
        let pairs: Vec<(String, String)> = docs
            .iter()
            .map(|doc| (doc.doc_id.clone(), doc.indexing_text()))
            .collect();

        self.build_index_from_docs(pairs.iter().cloned());
        for doc in docs {
            if let Some(title) = &doc.title {
                self.titles.insert(doc.doc_id.clone(), title.clone());
            }
        }

        if self.encoder.is_some() {
            self.index_sparse_from_docs(&pairs, batch_size)?;
        }

        Ok(())
    }

    /// Title of a document, if one was indexed.
    pub fn title(&self, doc_id: &str) -> Option<&str> {
        self.titles.get(doc_id).map(String::as_str)
    }

    /// The full doc-id to title map.
    pub fn titles(&self) -> &HashMap<String, String> {
        &self.titles
    }

    /// Record a title for a document.
    pub fn set_title(&mut self, doc_id: impl Into<String>, title: impl Into<String>) {
        self.titles.insert(doc_id.into(), title.into());
    }

    /// BM25-only search over the lexical leg.
    ///
    /// Returns `[]` when the lexical index is unavailable or the query is
    /// degenerate.
    pub fn search_bm25(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        match &self.index {
            Some(index) => index.search(query, top_k, self.config.bm25_params()),
            None => Vec::new(),
        }
    }

    /// Sparse-only search over the learned leg.
    ///
    /// Unlike the hybrid path, this surfaces errors: the caller asked for
    /// the sparse leg specifically.
    pub fn search_sparse(&self, query: &str, top_k: usize) -> Result<Vec<(String, f32)>, EngineError> {
        let index = self.sparse.as_ref().ok_or(EngineError::IndexUnavailable)?;
        let encoder = self.encoder.as_ref().ok_or(EngineError::EncoderUnavailable)?;

        let query_vector = encoder.encode(query)?;
        Ok(index.search(&query_vector, top_k))
    }

    /// Hybrid search with the configured `rrf_k` and `candidates_k`.
    pub fn hybrid_search(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        self.hybrid_search_with(query, top_k, self.config.rrf_k, self.config.candidates_k)
    }

    /// Hybrid search with per-call fusion parameters.
    ///
    /// Runs both legs at depth `candidates_k` in parallel, fuses with RRF,
    /// and returns the top `top_k` fused results. An empty query returns
    /// `[]` before the encoder is touched. One leg failing or being
    /// unavailable reduces the result to the other leg; both legs empty
    /// yields `[]`.
    pub fn hybrid_search_with(
        &self,
        query: &str,
        top_k: usize,
        rrf_k: u32,
        candidates_k: usize,
    ) -> Vec<(String, f32)> {
        if query.trim().is_empty() || top_k == 0 {
            return Vec::new();
        }

        let (bm25_list, sparse_list) = rayon::join(
            || self.search_bm25(query, candidates_k),
            || self.sparse_candidates(query, candidates_k),
        );

        let mut lists: Vec<&[(String, f32)]> = Vec::new();
        if !bm25_list.is_empty() {
            lists.push(&bm25_list);
        }
        if !sparse_list.is_empty() {
            lists.push(&sparse_list);
        }
        if lists.is_empty() {
            return Vec::new();
        }

        let mut fused = quarry_fusion::fuse(&lists, RrfConfig { k: rrf_k });
        fused.truncate(top_k);
        fused
    }

    /// The sparse leg as used by hybrid search: failures degrade to an
    /// empty list instead of propagating.
    fn sparse_candidates(&self, query: &str, candidates_k: usize) -> Vec<(String, f32)> {
        let (Some(index), Some(encoder)) = (self.sparse.as_ref(), self.encoder.as_ref()) else {
            return Vec::new();
        };

        match encoder.encode(query) {
            Ok(query_vector) => index.search(&query_vector, candidates_k),
            Err(e) => {
                tracing::warn!(error = %e, "sparse leg failed; serving BM25 leg only");
                Vec::new()
            }
        }
    }

    /// Persist every component that exists to its configured path.
    pub fn save(&self) -> Result<(), EngineError> {
        if let Some(index) = &self.index {
            index.save(&self.config.index_path)?;
        }
        if let Some(sparse) = &self.sparse {
            sparse.save(&self.config.splade_index_path)?;
        }
        titles::save(&self.config.titles_path, &self.titles)?;
        Ok(())
    }

    /// Load whatever artifacts exist at the configured paths.
    ///
    /// A missing artifact merely disables its leg; corruption or version
    /// mismatch is an error (the caller must rebuild). Returns `Ok(true)`
    /// if at least one retrieval leg loaded.
    pub fn load(&mut self) -> Result<bool, EngineError> {
        let mut any = false;

        match PositionalIndex::load(&self.config.index_path) {
            Ok(index) => {
                tracing::info!(documents = index.doc_count(), "lexical index loaded");
                self.index = Some(index);
                any = true;
            }
            Err(PersistenceError::NotFound(path)) => {
                tracing::info!(%path, "lexical index artifact missing; leg disabled");
            }
            Err(e) => return Err(e.into()),
        }

        match SparseIndex::load(&self.config.splade_index_path) {
            Ok(sparse) => {
                tracing::info!(documents = sparse.doc_count(), "sparse index loaded");
                self.sparse = Some(sparse);
                any = true;
            }
            Err(PersistenceError::NotFound(path)) => {
                tracing::info!(%path, "sparse index artifact missing; leg disabled");
            }
            Err(e) => return Err(e.into()),
        }

        match titles::load(&self.config.titles_path) {
            Ok(titles) => self.titles = titles,
            Err(PersistenceError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        Ok(any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.k1, 1.5);
        assert_eq!(config.b, 0.75);
        assert_eq!(config.rrf_k, 60);
        assert_eq!(config.candidates_k, 2000);
        assert_eq!(config.top_k, 10);
        assert_eq!(config.index_path, PathBuf::from("data/index.bin"));
        assert_eq!(config.splade_index_path, PathBuf::from("data/splade_index"));
        assert_eq!(config.titles_path, PathBuf::from("data/titles.bin"));
    }

    #[test]
    fn test_empty_engine_searches_empty() {
        let engine = SearchEngine::new(EngineConfig::default());
        assert!(engine.search_bm25("anything", 10).is_empty());
        assert!(engine.hybrid_search("anything", 10).is_empty());
        assert!(matches!(
            engine.search_sparse("anything", 10),
            Err(EngineError::IndexUnavailable)
        ));
    }

    #[test]
    fn test_empty_query_short_circuits() {
        let mut engine = SearchEngine::new(EngineConfig::default());
        engine.build_index_from_docs(vec![("d1".to_string(), "cat dog".to_string())]);
        assert!(engine.hybrid_search("", 10).is_empty());
        assert!(engine.hybrid_search("   ", 10).is_empty());
    }
}
