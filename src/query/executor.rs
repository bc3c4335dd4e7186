//! Query executor for running queries against a snapshot's segments
//!
//! Each segment is executed and scored independently with collection-wide
//! statistics, and the best `top_k` hits are kept in a bounded min-heap.
//! Hits are ordered by descending score, ties by ascending document slot.

use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::segment::{Bm25Params, DocNo, DocSlot, IndexStatistics, SegmentReader};
use crate::Result;

/// A scored match, addressed by segment index and docno
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredDoc {
    /// Index into the segment list the query ran against
    pub segment: usize,
    pub docno: u32,
    pub slot: DocSlot,
    pub score: f32,
}

/// Query execution result
#[derive(Debug)]
pub struct QueryResult {
    /// Best hits, best first
    pub hits: Vec<ScoredDoc>,
    /// Number of matching documents before truncation
    pub total_hits: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScoreEntry {
    score: OrderedFloat<f32>,
    slot: DocSlot,
    segment: usize,
    docno: u32,
}

// Greater means better: higher score first, then the older slot
impl Ord for ScoreEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.slot.cmp(&self.slot))
    }
}

impl PartialOrd for ScoreEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Query executor for running queries
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute `query` over `segments` and return the `top_k` best hits
    pub fn search(
        query: &dyn QueryNode,
        segments: &[Arc<SegmentReader>],
        stats: &IndexStatistics,
        params: &Bm25Params,
        top_k: usize,
    ) -> Result<QueryResult> {
        let mut total_hits = 0u64;
        if top_k == 0 {
            return Ok(QueryResult {
                hits: Vec::new(),
                total_hits,
            });
        }

        // The heap never holds more entries than there are documents.
        let capacity = top_k.min(usize::try_from(stats.total_docs).unwrap_or(usize::MAX));
        let mut heap: BinaryHeap<Reverse<ScoreEntry>> = BinaryHeap::with_capacity(capacity);

        for (segment_idx, segment) in segments.iter().enumerate() {
            let ctx = QueryContext::new(segment, stats, params);
            let matches = query.execute(&ctx)?;
            total_hits += matches.len();

            for docno in matches.iter() {
                let Some(score) = query.score(&ctx, docno)? else {
                    continue;
                };
                let Some(slot) = segment.slot(DocNo::new(docno)) else {
                    continue;
                };

                let entry = ScoreEntry {
                    score: OrderedFloat(score),
                    slot,
                    segment: segment_idx,
                    docno,
                };
                if heap.len() < top_k {
                    heap.push(Reverse(entry));
                } else if let Some(min) = heap.peek() {
                    if entry > min.0 {
                        heap.pop();
                        heap.push(Reverse(entry));
                    }
                }
            }
        }

        let mut results: Vec<ScoreEntry> = heap.into_iter().map(|Reverse(entry)| entry).collect();
        results.sort_by(|a, b| b.cmp(a));

        Ok(QueryResult {
            hits: results
                .into_iter()
                .map(|entry| ScoredDoc {
                    segment: entry.segment,
                    docno: entry.docno,
                    slot: entry.slot,
                    score: entry.score.0,
                })
                .collect(),
            total_hits,
        })
    }
}
