//! Rank fusion for hybrid search.
//!
//! Combines ranked candidate lists from heterogeneous retrievers into a
//! single ranking using Reciprocal Rank Fusion (RRF). BM25 and learned
//! sparse retrieval produce score distributions with incomparable
//! magnitudes; RRF sidesteps calibration entirely by fusing on ranks:
//!
//! ```text
//! RRF(d) = Σ_L 1 / (k + rank_L(d) + 1)
//! ```
//!
//! summed over every input list `L` in which document `d` appears, with
//! 0-based ranks. The smoothing constant `k` (default 60) damps the
//! advantage of the very top ranks; a document appearing in only one list
//! still contributes.
//!
//! Input scores are only used implicitly, through the order of each list;
//! output scores are the fused RRF values. For `n` input lists every fused
//! score lies in `(0, n/(k+1)]`.
//!
//! # Example
//!
//! ```rust
//! use quarry_fusion::rrf;
//!
//! let bm25 = vec![("a", 12.0), ("b", 7.5), ("c", 0.4)];
//! let sparse = vec![("b", 0.92), ("a", 0.87), ("d", 0.11)];
//!
//! let fused = rrf(&bm25, &sparse);
//! assert_eq!(fused[0].0, "a"); // ties broken by ascending id
//! ```

use std::collections::HashMap;
use std::hash::Hash;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Reciprocal Rank Fusion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RrfConfig {
    /// Smoothing constant `k`. Larger values flatten the contribution of
    /// top ranks. Default: 60.
    pub k: u32,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

/// Fuse any number of ranked lists under an explicit configuration.
pub fn fuse<Id>(lists: &[&[(Id, f32)]], config: RrfConfig) -> Vec<(Id, f32)>
where
    Id: Eq + Hash + Ord + Clone,
{
    rrf_multi_k(lists, config.k)
}

/// Fuse two ranked lists with the default smoothing constant.
pub fn rrf<Id>(a: &[(Id, f32)], b: &[(Id, f32)]) -> Vec<(Id, f32)>
where
    Id: Eq + Hash + Ord + Clone,
{
    rrf_k(a, b, DEFAULT_RRF_K)
}

/// Fuse two ranked lists with an explicit smoothing constant.
pub fn rrf_k<Id>(a: &[(Id, f32)], b: &[(Id, f32)], k: u32) -> Vec<(Id, f32)>
where
    Id: Eq + Hash + Ord + Clone,
{
    rrf_multi_k(&[a, b], k)
}

/// Fuse any number of ranked lists with the default smoothing constant.
pub fn rrf_multi<Id>(lists: &[&[(Id, f32)]]) -> Vec<(Id, f32)>
where
    Id: Eq + Hash + Ord + Clone,
{
    rrf_multi_k(lists, DEFAULT_RRF_K)
}

/// Fuse any number of ranked lists with an explicit smoothing constant.
///
/// Each list is consumed in its given order; input scores are ignored
/// beyond the ordering they produced. The fused list is sorted by RRF score
/// descending, ties broken by ascending id, and contains every id that
/// appears in at least one input list. Empty inputs fuse to an empty list.
pub fn rrf_multi_k<Id>(lists: &[&[(Id, f32)]], k: u32) -> Vec<(Id, f32)>
where
    Id: Eq + Hash + Ord + Clone,
{
    let mut fused: HashMap<Id, f64> = HashMap::new();

    for list in lists {
        for (rank, (id, _)) in list.iter().enumerate() {
            *fused.entry(id.clone()).or_insert(0.0) +=
                1.0 / (k as f64 + rank as f64 + 1.0);
        }
    }

    let mut ranked: Vec<(Id, f64)> = fused.into_iter().collect();
    ranked.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    ranked
        .into_iter()
        .map(|(id, score)| (id, score as f32))
        .collect()
}
