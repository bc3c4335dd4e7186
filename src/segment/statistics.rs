//! Statistics for BM25+ scoring
//!
//! Each segment stores per-document lengths. Scoring uses collection-wide
//! values (document count, average length, document frequency) aggregated
//! over every segment of a snapshot, so a document scores the same no matter
//! which segment holds it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::reader::SegmentReader;
use super::types::DocNo;

/// BM25+ parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation parameter
    pub k1: f32,
    /// Length normalization parameter
    pub b: f32,
    /// BM25+ delta parameter (avoids zero scores for high-frequency terms)
    pub delta: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            delta: 1.0,
        }
    }
}

impl Bm25Params {
    /// Robertson-Sparck-Jones IDF, always positive for `df <= total_docs`
    pub fn idf(&self, df: u64, total_docs: u64) -> f32 {
        let n = total_docs as f32;
        let df = df as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// BM25+ with a precomputed IDF; phrases pass the summed IDF of their terms
    pub fn score_with_idf(&self, idf: f32, tf: u32, doc_len: u32, avgdl: f64) -> f32 {
        if tf == 0 {
            return 0.0;
        }

        let avgdl = (avgdl as f32).max(1.0);
        let tf = tf as f32;

        let norm = 1.0 - self.b + self.b * (doc_len as f32 / avgdl);
        let tf_component = (tf * (self.k1 + 1.0)) / (tf + self.k1 * norm);
        idf * (tf_component + self.delta)
    }
}

/// Statistics for a single segment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SegmentStatistics {
    /// Total number of documents in this segment
    pub doc_count: u32,
    /// Sum of all document lengths (for computing avgdl)
    pub total_doc_length: u64,
    /// Document lengths indexed by docno
    doc_lengths: Vec<u32>,
}

impl SegmentStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create statistics with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            doc_count: 0,
            total_doc_length: 0,
            doc_lengths: Vec::with_capacity(capacity),
        }
    }

    /// Add a document with the given length
    pub fn add_document(&mut self, doc_len: u32) -> DocNo {
        let docno = DocNo::new(self.doc_count);
        self.doc_lengths.push(doc_len);
        self.total_doc_length += doc_len as u64;
        self.doc_count += 1;
        docno
    }

    /// Get document length for a docno
    pub fn get_doc_length(&self, docno: DocNo) -> Option<u32> {
        self.doc_lengths.get(docno.as_usize()).copied()
    }
}

/// Upper bound on cached document frequencies per snapshot
pub const MAX_CACHED_DFS: usize = 16_384;

/// Collection statistics aggregated over the segments of one snapshot
///
/// Document frequencies are summed lazily per term. Only terms present in
/// the index are cached, and at most [`MAX_CACHED_DFS`] of them, so query
/// text cannot grow the cache past the snapshot's vocabulary.
#[derive(Debug)]
pub struct IndexStatistics {
    /// Total documents across all segments
    pub total_docs: u64,
    /// Global average document length
    pub global_avgdl: f64,
    segments: Vec<Arc<SegmentReader>>,
    term_dfs: RwLock<HashMap<String, u64>>,
}

impl IndexStatistics {
    /// Aggregate statistics from multiple segments
    pub fn aggregate(segments: &[Arc<SegmentReader>]) -> Self {
        let total_docs: u64 = segments.iter().map(|s| s.stats().doc_count as u64).sum();
        let total_length: u64 = segments.iter().map(|s| s.stats().total_doc_length).sum();
        let global_avgdl = if total_docs > 0 {
            total_length as f64 / total_docs as f64
        } else {
            0.0
        };

        Self {
            total_docs,
            global_avgdl,
            segments: segments.to_vec(),
            term_dfs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents containing `term`, over all segments
    pub fn doc_frequency(&self, term: &str) -> u64 {
        if let Some(&df) = self.term_dfs.read().get(term) {
            return df;
        }

        let df: u64 = self
            .segments
            .iter()
            .map(|s| s.doc_frequency(term) as u64)
            .sum();
        if df > 0 {
            let mut cache = self.term_dfs.write();
            if cache.len() < MAX_CACHED_DFS {
                cache.insert(term.to_string(), df);
            }
        }
        df
    }

    #[cfg(test)]
    pub(crate) fn cached_dfs(&self) -> usize {
        self.term_dfs.read().len()
    }

    /// IDF for a term over the whole collection
    pub fn idf(&self, term: &str, params: &Bm25Params) -> f32 {
        params.idf(self.doc_frequency(term), self.total_docs)
    }
}
