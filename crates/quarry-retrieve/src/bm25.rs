//! Positional inverted index and Okapi BM25 scoring.
//!
//! The index stores, for every post-tokenization term, the documents it
//! occurs in and the 0-based token positions of each occurrence. Corpus
//! statistics (document count, per-document length, average length) live
//! alongside the postings and feed the BM25 formula.
//!
//! # Build / serve phases
//!
//! Building and serving are separate types with a one-way transition:
//! [`IndexBuilder`] accepts documents, [`IndexBuilder::finalize`] computes
//! the corpus statistics and yields a read-only [`PositionalIndex`]. The
//! serving type has no mutating methods, so a finalized index is safe to
//! share across concurrent readers.
//!
//! # BM25 formula
//!
//! ```text
//! BM25(q, d) = Σ IDF(q_i) * (f(q_i, d) * (k1 + 1)) / (f(q_i, d) + k1 * (1 - b + b * |d|/avgdl))
//! ```
//!
//! Where:
//! - `f(q_i, d)` = frequency of term q_i in document d (the position count)
//! - `|d|` = length of document d in tokens
//! - `avgdl` = average document length in the corpus
//! - `k1` = term frequency saturation parameter (default 1.5)
//! - `b` = length normalization parameter (default 0.75)
//! - `IDF(q_i) = ln((N - df + 0.5) / (df + 0.5) + 1)`
//!
//! The `+ 1` inside the logarithm is a variant choice that keeps IDF
//! positive even for terms appearing in most documents.

use crate::persistence::codec::delta;
use crate::persistence::{
    self, PersistenceError, PersistenceResult, INDEX_MAGIC,
};
use crate::tokenize::{Tokenizer, TokenizerConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation parameter (k1).
    /// Controls how quickly term frequency saturates.
    /// Default: 1.5
    pub k1: f32,

    /// Length normalization parameter (b).
    /// Controls the strength of length normalization.
    /// Default: 0.75
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Mutable index under construction.
///
/// Collects positional postings and document lengths. Call
/// [`IndexBuilder::finalize`] to compute statistics and obtain the read-only
/// [`PositionalIndex`].
pub struct IndexBuilder {
    tokenizer: Tokenizer,

    /// Term -> (doc_id -> ascending token positions)
    postings: HashMap<String, HashMap<String, Vec<u32>>>,

    /// doc_id -> document length in tokens
    doc_lengths: HashMap<String, u32>,
}

impl IndexBuilder {
    /// Create a builder with the default tokenizer.
    pub fn new() -> Self {
        Self::with_tokenizer(Tokenizer::new())
    }

    /// Create a builder with an explicit tokenizer.
    ///
    /// The tokenizer becomes part of the index identity: it is carried into
    /// the finalized index, reused for queries, and fingerprinted in the
    /// persisted artifact.
    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            postings: HashMap::new(),
            doc_lengths: HashMap::new(),
        }
    }

    /// Tokenize `text` and record its postings under `doc_id`.
    ///
    /// Each `doc_id` must be added at most once; re-adding an existing id is
    /// a programmer error, caught by a debug assertion.
    pub fn add_document(&mut self, doc_id: &str, text: &str) {
        debug_assert!(
            !self.doc_lengths.contains_key(doc_id),
            "document {:?} added twice",
            doc_id
        );

        let tokens = self.tokenizer.tokenize(text);
        self.doc_lengths
            .insert(doc_id.to_string(), tokens.len() as u32);

        for (position, token) in tokens.into_iter().enumerate() {
            self.postings
                .entry(token)
                .or_default()
                .entry(doc_id.to_string())
                .or_default()
                .push(position as u32);
        }
    }

    /// Number of documents added so far.
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Compute corpus statistics and transition to the read-only index.
    pub fn finalize(self) -> PositionalIndex {
        let doc_count = self.doc_lengths.len();
        let total_len: u64 = self.doc_lengths.values().map(|&l| l as u64).sum();
        let avg_doc_len = if doc_count > 0 {
            total_len as f64 / doc_count as f64
        } else {
            0.0
        };

        PositionalIndex {
            tokenizer: self.tokenizer,
            postings: self.postings,
            doc_lengths: self.doc_lengths,
            doc_count,
            avg_doc_len,
        }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only positional inverted index with corpus statistics.
///
/// Produced by [`IndexBuilder::finalize`] or [`PositionalIndex::load`]; has
/// no mutating methods.
#[derive(Debug)]
pub struct PositionalIndex {
    tokenizer: Tokenizer,
    postings: HashMap<String, HashMap<String, Vec<u32>>>,
    doc_lengths: HashMap<String, u32>,
    doc_count: usize,
    avg_doc_len: f64,
}

/// Serialized image of a [`PositionalIndex`].
///
/// Positions are delta-encoded before serialization; postcard's varint
/// integers keep the small gaps compact on disk.
#[derive(Serialize, Deserialize)]
struct IndexImage {
    tokenizer: TokenizerConfig,
    postings: HashMap<String, HashMap<String, Vec<u32>>>,
    doc_lengths: HashMap<String, u32>,
    doc_count: u64,
    avg_doc_len: f64,
}

impl PositionalIndex {
    /// Number of documents in the corpus.
    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    /// Average document length in tokens.
    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    /// Length of a document in tokens, if indexed.
    pub fn doc_len(&self, doc_id: &str) -> Option<u32> {
        self.doc_lengths.get(doc_id).copied()
    }

    /// Document frequency: number of documents containing `term`.
    pub fn df(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, |docs| docs.len())
    }

    /// Token positions of `term` within `doc_id`, if present.
    pub fn positions(&self, term: &str, doc_id: &str) -> Option<&[u32]> {
        self.postings
            .get(term)
            .and_then(|docs| docs.get(doc_id))
            .map(|positions| positions.as_slice())
    }

    /// The tokenizer this index was built with.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Retrieve the top-k documents for a free-text query using BM25.
    ///
    /// The query runs through the same tokenizer the index was built with.
    /// Repeated query tokens are scored once per occurrence, so a term that
    /// appears twice in the query contributes twice; this matches the
    /// reference engine and acts as a soft form of query-term weighting.
    ///
    /// Returns `(doc_id, score)` pairs sorted by score descending, ties
    /// broken by ascending `doc_id`. Degenerate input (empty query, no
    /// matching term, empty corpus) yields an empty vec, never an error.
    ///
    /// Scores accumulate in `f64` and are emitted as `f32`.
    pub fn search(&self, query: &str, top_k: usize, params: Bm25Params) -> Vec<(String, f32)> {
        let query_tokens = self.tokenizer.tokenize(query);
        if query_tokens.is_empty() || top_k == 0 || self.doc_count == 0 {
            return Vec::new();
        }
        // All-empty corpus: every doc_len is 0, nothing can match
        if self.avg_doc_len == 0.0 {
            return Vec::new();
        }

        let k1 = params.k1 as f64;
        let b = params.b as f64;
        let n = self.doc_count as f64;

        let mut scores: HashMap<&str, f64> = HashMap::new();

        for term in &query_tokens {
            let Some(postings) = self.postings.get(term) else {
                continue;
            };

            let df = postings.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for (doc_id, positions) in postings {
                let tf = positions.len() as f64;
                let dl = self.doc_lengths.get(doc_id).copied().unwrap_or(0) as f64;

                let numerator = tf * (k1 + 1.0);
                let denominator = tf + k1 * (1.0 - b + b * dl / self.avg_doc_len);

                *scores.entry(doc_id.as_str()).or_insert(0.0) += idf * numerator / denominator;
            }
        }

        let mut ranked: Vec<(&str, f64)> = scores.into_iter().collect();
        ranked.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        ranked
            .into_iter()
            .take(top_k)
            .map(|(doc_id, score)| (doc_id.to_string(), score as f32))
            .collect()
    }

    /// Save the index as a single artifact file.
    ///
    /// The header records the tokenizer fingerprint; [`PositionalIndex::load`]
    /// refuses artifacts built with an incompatible tokenizer.
    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let image = IndexImage {
            tokenizer: self.tokenizer.config().clone(),
            postings: self
                .postings
                .iter()
                .map(|(term, docs)| {
                    let encoded = docs
                        .iter()
                        .map(|(doc_id, positions)| (doc_id.clone(), delta::encode(positions)))
                        .collect();
                    (term.clone(), encoded)
                })
                .collect(),
            doc_lengths: self.doc_lengths.clone(),
            doc_count: self.doc_count as u64,
            avg_doc_len: self.avg_doc_len,
        };

        let payload = postcard::to_allocvec(&image)?;
        let bytes =
            persistence::frame_artifact(INDEX_MAGIC, self.tokenizer.fingerprint(), &payload)?;
        persistence::atomic_write(path.as_ref(), &bytes)
    }

    /// Load an index artifact written by [`PositionalIndex::save`].
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::NotFound`] when the file does not exist
    /// - [`PersistenceError::Format`] on magic/version/fingerprint mismatch
    /// - [`PersistenceError::ChecksumMismatch`] on payload corruption
    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let bytes = persistence::read_artifact(path.as_ref())?;
        let (header, payload) = persistence::split_artifact(&bytes, INDEX_MAGIC)?;

        let image: IndexImage = postcard::from_bytes(payload)
            .map_err(|e| PersistenceError::Deserialization(e.to_string()))?;

        let tokenizer = Tokenizer::with_config(image.tokenizer);
        if tokenizer.fingerprint() != header.fingerprint {
            return Err(PersistenceError::Format {
                message: "Tokenizer fingerprint mismatch".to_string(),
                expected: Some(header.fingerprint.to_string()),
                actual: Some(tokenizer.fingerprint().to_string()),
            });
        }

        let postings = image
            .postings
            .into_iter()
            .map(|(term, docs)| {
                let decoded = docs
                    .into_iter()
                    .map(|(doc_id, deltas)| (doc_id, delta::decode(&deltas)))
                    .collect();
                (term, decoded)
            })
            .collect();

        Ok(Self {
            tokenizer,
            postings,
            doc_lengths: image.doc_lengths,
            doc_count: image.doc_count as usize,
            avg_doc_len: image.avg_doc_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_index() -> PositionalIndex {
        let mut builder = IndexBuilder::new();
        builder.add_document("d1", "cat cat dog");
        builder.add_document("d2", "cat mouse");
        builder.add_document("d3", "bird");
        builder.finalize()
    }

    #[test]
    fn test_positions_recorded() {
        let mut builder = IndexBuilder::new();
        builder.add_document("doc1", "apple banana apple");
        let index = builder.finalize();

        let term = index.tokenizer().tokenize("apple").remove(0);
        assert_eq!(index.positions(&term, "doc1"), Some(&[0, 2][..]));
        assert_eq!(index.doc_len("doc1"), Some(3));
    }

    #[test]
    fn test_statistics() {
        let mut builder = IndexBuilder::new();
        builder.add_document("doc1", "python java");
        builder.add_document("doc2", "python");
        let index = builder.finalize();

        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.doc_len("doc1"), Some(2));
        assert_eq!(index.doc_len("doc2"), Some(1));
        assert!((index.avg_doc_len() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bm25_ordering() {
        let index = small_index();
        let results = index.search("cat", 10, Bm25Params::default());

        // d1 has tf=2, d2 has tf=1; d3 does not match at all
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "d1");
        assert_eq!(results[1].0, "d2");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let index = small_index();
        assert!(index.search("", 10, Bm25Params::default()).is_empty());
        // Pure-stopword queries tokenize to nothing
        assert!(index.search("the of and", 10, Bm25Params::default()).is_empty());
    }

    #[test]
    fn test_unknown_terms_skipped() {
        let index = small_index();
        assert!(index
            .search("zebra quagga", 10, Bm25Params::default())
            .is_empty());
    }

    #[test]
    fn test_top_k_truncation() {
        let index = small_index();
        let results = index.search("cat", 1, Bm25Params::default());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "d1");
    }

    #[test]
    fn test_tie_break_ascending_doc_id() {
        let mut builder = IndexBuilder::new();
        // Identical documents score identically
        builder.add_document("b", "wolf");
        builder.add_document("a", "wolf");
        builder.add_document("c", "wolf");
        let index = builder.finalize();

        let results = index.search("wolf", 10, Bm25Params::default());
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repeated_query_terms_accumulate() {
        let index = small_index();

        let once = index.search("cat", 10, Bm25Params::default());
        let twice = index.search("cat cat", 10, Bm25Params::default());

        // Each occurrence contributes a full pass, so the score doubles
        assert_eq!(once[0].0, twice[0].0);
        assert!((twice[0].1 - 2.0 * once[0].1).abs() < 1e-5);
    }

    #[test]
    fn test_idf_favors_rare_terms() {
        let mut builder = IndexBuilder::new();
        builder.add_document("d1", "common rare");
        builder.add_document("d2", "common word");
        builder.add_document("d3", "common term");
        let index = builder.finalize();

        let rare = index.search("rare", 10, Bm25Params::default());
        let common = index.search("common", 10, Bm25Params::default());
        assert!(rare[0].1 > common[0].1);
    }

    #[test]
    fn test_empty_corpus() {
        let index = IndexBuilder::new().finalize();
        assert_eq!(index.doc_count(), 0);
        assert!(index.search("anything", 10, Bm25Params::default()).is_empty());
    }

    #[test]
    fn test_save_load_roundtrip_scores_identically() {
        let index = small_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");

        index.save(&path).unwrap();
        let loaded = PositionalIndex::load(&path).unwrap();

        assert_eq!(loaded.doc_count(), index.doc_count());
        assert_eq!(loaded.avg_doc_len(), index.avg_doc_len());

        for query in ["cat", "cat dog", "mouse bird", "bird"] {
            assert_eq!(
                index.search(query, 10, Bm25Params::default()),
                loaded.search(query, 10, Bm25Params::default()),
                "query {:?} diverged after reload",
                query
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PositionalIndex::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_corruption() {
        let index = small_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        index.save(&path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let err = PositionalIndex::load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::ChecksumMismatch { .. }));
    }
}
