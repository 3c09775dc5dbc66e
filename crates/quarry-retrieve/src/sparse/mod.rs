//! Learned sparse retrieval over encoder-produced term-expansion vectors.
//!
//! The index stores the transpose of a corpus of sparse vectors: one posting
//! column per active term id, holding `(document ordinal, weight)` pairs.
//! Scoring a query vector is then a classic inverted-list traversal: for each
//! query term, walk its column and accumulate `query_weight * doc_weight`
//! into the document's dot product. Documents untouched by any query term
//! are never materialized.
//!
//! Like the lexical index, building and serving are separate types:
//! [`SparseIndexBuilder`] accepts encoder output batches,
//! [`SparseIndexBuilder::build`] compacts and yields the read-only
//! [`SparseIndex`].
//!
//! Document ids are external opaque strings; internally the index works with
//! `u32` ordinals into a doc-id table and only translates back on output.

mod vector;

pub use self::vector::{dot_product, SparseVector};

use crate::persistence::{
    self, PersistenceError, PersistenceResult, SPARSE_MAGIC,
};
use crate::RetrieveError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// File names inside a sparse index directory.
const MANIFEST_FILE: &str = "manifest.bin";
const POSTINGS_FILE: &str = "postings.bin";
const DOC_IDS_FILE: &str = "doc_ids.bin";

/// Mutable sparse index under construction.
pub struct SparseIndexBuilder {
    doc_ids: Vec<String>,

    /// term_id -> (doc ordinal, weight), ordinals ascending
    postings: HashMap<u32, Vec<(u32, f32)>>,
}

impl SparseIndexBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            doc_ids: Vec::new(),
            postings: HashMap::new(),
        }
    }

    /// Append a batch of encoded documents.
    ///
    /// The three slices are parallel: document `i` has active term ids
    /// `indices_batch[i]` with weights `values_batch[i]`, exactly the shape
    /// a batch encoder emits.
    ///
    /// # Errors
    ///
    /// - [`RetrieveError::BatchShapeMismatch`] when the batch arrays disagree
    ///   in length
    /// - [`RetrieveError::InvalidSparseVector`] when one document's arrays
    ///   disagree in length or repeat a term id
    pub fn add_batch(
        &mut self,
        doc_ids: &[String],
        indices_batch: &[Vec<u32>],
        values_batch: &[Vec<f32>],
    ) -> Result<(), RetrieveError> {
        if doc_ids.len() != indices_batch.len() || doc_ids.len() != values_batch.len() {
            return Err(RetrieveError::BatchShapeMismatch {
                doc_ids: doc_ids.len(),
                indices: indices_batch.len(),
                values: values_batch.len(),
            });
        }

        for ((doc_id, indices), values) in doc_ids.iter().zip(indices_batch).zip(values_batch) {
            if indices.len() != values.len() {
                return Err(RetrieveError::InvalidSparseVector(format!(
                    "document {:?}: {} indices but {} values",
                    doc_id,
                    indices.len(),
                    values.len()
                )));
            }

            let mut seen: Vec<u32> = indices.clone();
            seen.sort_unstable();
            for window in seen.windows(2) {
                if window[0] == window[1] {
                    return Err(RetrieveError::InvalidSparseVector(format!(
                        "document {:?}: duplicate term id {}",
                        doc_id, window[0]
                    )));
                }
            }

            let ordinal = self.doc_ids.len() as u32;
            self.doc_ids.push(doc_id.clone());

            for (&term_id, &weight) in indices.iter().zip(values) {
                self.postings
                    .entry(term_id)
                    .or_default()
                    .push((ordinal, weight));
            }
        }

        Ok(())
    }

    /// Number of documents added so far.
    pub fn doc_count(&self) -> usize {
        self.doc_ids.len()
    }

    /// Compact the postings and transition to the read-only index.
    pub fn build(self) -> SparseIndex {
        let mut postings = self.postings;
        // Ordinals are assigned in insertion order, so columns are already
        // sorted; keep the invariant explicit for future mutation paths.
        for column in postings.values_mut() {
            column.sort_unstable_by_key(|&(ordinal, _)| ordinal);
        }

        SparseIndex {
            doc_ids: self.doc_ids,
            postings,
        }
    }
}

impl Default for SparseIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only transpose index of sparse document vectors.
#[derive(Debug)]
pub struct SparseIndex {
    doc_ids: Vec<String>,
    postings: HashMap<u32, Vec<(u32, f32)>>,
}

/// Serialized manifest for a sparse index directory.
#[derive(Serialize, Deserialize)]
struct SparseManifest {
    term_count: u64,
    doc_count: u64,
    postings_checksum: u32,
    doc_ids_checksum: u32,
}

impl SparseIndex {
    /// Number of documents in the index.
    pub fn doc_count(&self) -> usize {
        self.doc_ids.len()
    }

    /// Number of distinct active term ids.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Dot-product scores of a query vector against every touched document.
    ///
    /// Returns document ordinals mapped to scores; documents sharing no
    /// active term with the query are omitted.
    pub fn score(&self, query: &SparseVector) -> HashMap<u32, f32> {
        let mut scores: HashMap<u32, f32> = HashMap::new();

        for (&term_id, &query_weight) in query.indices.iter().zip(&query.values) {
            let Some(column) = self.postings.get(&term_id) else {
                continue;
            };
            for &(ordinal, doc_weight) in column {
                *scores.entry(ordinal).or_insert(0.0) += query_weight * doc_weight;
            }
        }

        scores
    }

    /// Retrieve the top-k documents for a query vector.
    ///
    /// Returns `(doc_id, score)` pairs sorted by score descending, ties
    /// broken by ascending `doc_id`. An empty query vector yields an empty
    /// vec.
    pub fn search(&self, query: &SparseVector, top_k: usize) -> Vec<(String, f32)> {
        if query.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(u32, f32)> = self.score(query).into_iter().collect();
        ranked.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.doc_ids[a.0 as usize].cmp(&self.doc_ids[b.0 as usize]))
        });

        ranked
            .into_iter()
            .take(top_k)
            .map(|(ordinal, score)| (self.doc_ids[ordinal as usize].clone(), score))
            .collect()
    }

    /// Save the index into a directory: manifest, postings payload, and
    /// doc-id table.
    pub fn save(&self, dir: impl AsRef<Path>) -> PersistenceResult<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        // Postings payload: per term, its id, column length, and pairs
        let mut postings_payload = Vec::new();
        let mut term_ids: Vec<u32> = self.postings.keys().copied().collect();
        term_ids.sort_unstable();

        for term_id in &term_ids {
            let column = &self.postings[term_id];
            postings_payload.write_u32::<LittleEndian>(*term_id)?;
            postings_payload.write_u32::<LittleEndian>(column.len() as u32)?;
            for &(ordinal, weight) in column {
                postings_payload.write_u32::<LittleEndian>(ordinal)?;
                postings_payload.write_f32::<LittleEndian>(weight)?;
            }
        }

        let doc_ids_payload = postcard::to_allocvec(&self.doc_ids)?;

        let manifest = SparseManifest {
            term_count: self.postings.len() as u64,
            doc_count: self.doc_ids.len() as u64,
            postings_checksum: crc32fast::hash(&postings_payload),
            doc_ids_checksum: crc32fast::hash(&doc_ids_payload),
        };
        let manifest_payload = postcard::to_allocvec(&manifest)?;
        let manifest_bytes = persistence::frame_artifact(SPARSE_MAGIC, 0, &manifest_payload)?;

        persistence::atomic_write(&dir.join(POSTINGS_FILE), &postings_payload)?;
        persistence::atomic_write(&dir.join(DOC_IDS_FILE), &doc_ids_payload)?;
        // Manifest last: its presence marks a complete directory
        persistence::atomic_write(&dir.join(MANIFEST_FILE), &manifest_bytes)
    }

    /// Load a sparse index directory written by [`SparseIndex::save`].
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::NotFound`] when the manifest is absent
    /// - [`PersistenceError::Format`] / [`PersistenceError::ChecksumMismatch`]
    ///   on version or corruption problems
    pub fn load(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref();

        let manifest_bytes = persistence::read_artifact(&dir.join(MANIFEST_FILE))?;
        let (_, manifest_payload) = persistence::split_artifact(&manifest_bytes, SPARSE_MAGIC)?;
        let manifest: SparseManifest = postcard::from_bytes(manifest_payload)
            .map_err(|e| PersistenceError::Deserialization(e.to_string()))?;

        let postings_payload = persistence::read_artifact(&dir.join(POSTINGS_FILE))?;
        let actual = crc32fast::hash(&postings_payload);
        if actual != manifest.postings_checksum {
            return Err(PersistenceError::ChecksumMismatch {
                expected: manifest.postings_checksum,
                actual,
            });
        }

        let doc_ids_payload = persistence::read_artifact(&dir.join(DOC_IDS_FILE))?;
        let actual = crc32fast::hash(&doc_ids_payload);
        if actual != manifest.doc_ids_checksum {
            return Err(PersistenceError::ChecksumMismatch {
                expected: manifest.doc_ids_checksum,
                actual,
            });
        }

        let doc_ids: Vec<String> = postcard::from_bytes(&doc_ids_payload)
            .map_err(|e| PersistenceError::Deserialization(e.to_string()))?;
        if doc_ids.len() as u64 != manifest.doc_count {
            return Err(PersistenceError::Format {
                message: "Doc-id table length disagrees with manifest".to_string(),
                expected: Some(manifest.doc_count.to_string()),
                actual: Some(doc_ids.len().to_string()),
            });
        }

        let mut postings: HashMap<u32, Vec<(u32, f32)>> =
            HashMap::with_capacity(manifest.term_count as usize);
        let mut reader = std::io::Cursor::new(&postings_payload);
        for _ in 0..manifest.term_count {
            let term_id = reader.read_u32::<LittleEndian>()?;
            let len = reader.read_u32::<LittleEndian>()?;
            let mut column = Vec::with_capacity(len as usize);
            for _ in 0..len {
                let ordinal = reader.read_u32::<LittleEndian>()?;
                let weight = reader.read_f32::<LittleEndian>()?;
                column.push((ordinal, weight));
            }
            postings.insert(term_id, column);
        }

        Ok(Self { doc_ids, postings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_doc_index() -> SparseIndex {
        let mut builder = SparseIndexBuilder::new();
        builder
            .add_batch(
                &["doc0".to_string(), "doc1".to_string()],
                &[vec![0, 1, 2], vec![1, 2, 3]],
                &[vec![1.0, 0.5, 0.3], vec![0.8, 0.6, 0.4]],
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_search_ranks_by_dot_product() {
        let index = two_doc_index();
        let query = SparseVector::new(vec![0, 1], vec![1.0, 1.0]).unwrap();

        let results = index.search(&query, 10);
        assert_eq!(results.len(), 2);
        // doc0: 1.0*1.0 + 0.5*1.0 = 1.5; doc1: 0.8*1.0 = 0.8
        assert_eq!(results[0].0, "doc0");
        assert!((results[0].1 - 1.5).abs() < 1e-6);
        assert_eq!(results[1].0, "doc1");
        assert!((results[1].1 - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_untouched_documents_omitted() {
        let index = two_doc_index();
        // Term 0 only appears in doc0
        let query = SparseVector::new(vec![0], vec![1.0]).unwrap();

        let scores = index.score(&query);
        assert_eq!(scores.len(), 1);

        let results = index.search(&query, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "doc0");
    }

    #[test]
    fn test_unknown_terms_score_nothing() {
        let index = two_doc_index();
        let query = SparseVector::new(vec![99], vec![1.0]).unwrap();
        assert!(index.search(&query, 10).is_empty());
    }

    #[test]
    fn test_empty_query_vector() {
        let index = two_doc_index();
        let query = SparseVector::new_unchecked(Vec::new(), Vec::new());
        assert!(index.search(&query, 10).is_empty());
    }

    #[test]
    fn test_tie_break_ascending_doc_id() {
        let mut builder = SparseIndexBuilder::new();
        builder
            .add_batch(
                &["b".to_string(), "a".to_string()],
                &[vec![7], vec![7]],
                &[vec![0.5], vec![0.5]],
            )
            .unwrap();
        let index = builder.build();

        let query = SparseVector::new(vec![7], vec![1.0]).unwrap();
        let results = index.search(&query, 10);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
    }

    #[test]
    fn test_add_batch_shape_mismatch() {
        let mut builder = SparseIndexBuilder::new();
        let err = builder
            .add_batch(&["d".to_string()], &[vec![1], vec![2]], &[vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, RetrieveError::BatchShapeMismatch { .. }));
    }

    #[test]
    fn test_add_batch_rejects_duplicate_term_ids() {
        let mut builder = SparseIndexBuilder::new();
        let err = builder
            .add_batch(&["d".to_string()], &[vec![1, 1]], &[vec![1.0, 2.0]])
            .unwrap_err();
        assert!(matches!(err, RetrieveError::InvalidSparseVector(_)));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let index = two_doc_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splade_index");

        index.save(&path).unwrap();
        let loaded = SparseIndex::load(&path).unwrap();

        assert_eq!(loaded.doc_count(), index.doc_count());
        assert_eq!(loaded.term_count(), index.term_count());

        let query = SparseVector::new(vec![0, 1, 3], vec![1.0, 1.0, 1.0]).unwrap();
        assert_eq!(index.search(&query, 10), loaded.search(&query, 10));
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = SparseIndex::load(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_tampered_postings() {
        let index = two_doc_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splade_index");
        index.save(&path).unwrap();

        let postings_path = path.join("postings.bin");
        let mut bytes = std::fs::read(&postings_path).unwrap();
        bytes[0] ^= 0xFF;
        std::fs::write(&postings_path, &bytes).unwrap();

        let err = SparseIndex::load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::ChecksumMismatch { .. }));
    }
}
