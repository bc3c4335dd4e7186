//! Committed index state and readers pinned to it

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::handle::IndexShared;
use crate::highlight::HighlightTerms;
use crate::models::SearchHit;
use crate::query::QueryExecutor;
use crate::segment::{DocNo, IndexStatistics, SegmentManifest, SegmentReader};
use crate::Result;

/// One committed generation: the manifest, its loaded segments and the
/// collection statistics derived from them
pub struct IndexSnapshot {
    manifest: SegmentManifest,
    segments: Vec<Arc<SegmentReader>>,
    stats: IndexStatistics,
}

impl IndexSnapshot {
    pub(crate) fn new(manifest: SegmentManifest, segments: Vec<Arc<SegmentReader>>) -> Self {
        let stats = IndexStatistics::aggregate(&segments);
        Self {
            manifest,
            segments,
            stats,
        }
    }

    pub fn manifest(&self) -> &SegmentManifest {
        &self.manifest
    }

    pub fn segments(&self) -> &[Arc<SegmentReader>] {
        &self.segments
    }

    pub fn stats(&self) -> &IndexStatistics {
        &self.stats
    }

    /// Commit generation, bumped by every committed session
    pub fn generation(&self) -> u64 {
        self.manifest.generation
    }

    pub fn doc_count(&self) -> u64 {
        self.stats.total_docs
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// Searches one snapshot; commits made after it was created stay invisible
#[derive(Clone)]
pub struct IndexReader {
    snapshot: Arc<IndexSnapshot>,
    shared: Arc<IndexShared>,
}

impl IndexReader {
    pub(crate) fn new(snapshot: Arc<IndexSnapshot>, shared: Arc<IndexShared>) -> Self {
        Self { snapshot, shared }
    }

    /// Run a query string and return at most `limit` hits, best first.
    ///
    /// An empty query or a zero limit is not an error and returns no hits.
    pub fn search(&self, query_text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 || query_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let query = self.shared.parse_query(query_text)?;
        let result = QueryExecutor::search(
            query.as_ref(),
            self.snapshot.segments(),
            self.snapshot.stats(),
            &self.shared.config.bm25,
            limit,
        )?;

        let terms = HighlightTerms::from_query(query.as_ref());
        let mut segment_terms: HashMap<usize, HighlightTerms> = HashMap::new();
        let hits: Vec<SearchHit> = result
            .hits
            .iter()
            .filter_map(|hit| {
                let segment = self.snapshot.segments.get(hit.segment)?;
                let stored = segment.stored(DocNo::new(hit.docno))?;
                let terms = segment_terms
                    .entry(hit.segment)
                    .or_insert_with(|| terms.for_segment(segment));
                Some(SearchHit {
                    id: stored.id.clone(),
                    content: stored.content.clone(),
                    highlighted_content: self.shared.highlighter.highlight(terms, &stored.content),
                    payload: stored.payload.clone(),
                    score: hit.score,
                    slot: hit.slot,
                })
            })
            .collect();

        debug!(
            query = query_text,
            generation = self.generation(),
            total_hits = result.total_hits,
            returned = hits.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "search completed"
        );
        Ok(hits)
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation()
    }

    pub fn doc_count(&self) -> u64 {
        self.snapshot.doc_count()
    }

    pub fn segment_count(&self) -> usize {
        self.snapshot.segment_count()
    }

    pub fn snapshot(&self) -> &Arc<IndexSnapshot> {
        &self.snapshot
    }
}

impl std::fmt::Debug for IndexSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSnapshot")
            .field("generation", &self.generation())
            .field("segments", &self.segment_count())
            .field("stats", &self.stats)
            .finish()
    }
}

impl std::fmt::Debug for IndexReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexReader")
            .field("generation", &self.generation())
            .field("doc_count", &self.doc_count())
            .finish()
    }
}
