//! Query execution context
//!
//! A `QueryContext` binds one segment to the collection statistics of the
//! snapshot being searched. Decoded posting lists are cached for the lifetime
//! of the context, since scoring revisits the lists `execute` already read.

use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::segment::{Bm25Params, DocNo, IndexStatistics, Posting, SegmentReader};
use crate::Result;

type PostingsCache = RwLock<HashMap<String, Option<Arc<Vec<Posting>>>>>;

/// Per-segment view used while executing and scoring a query
pub struct QueryContext<'a> {
    segment: &'a SegmentReader,
    stats: &'a IndexStatistics,
    params: &'a Bm25Params,
    postings_cache: PostingsCache,
}

impl<'a> QueryContext<'a> {
    pub fn new(segment: &'a SegmentReader, stats: &'a IndexStatistics, params: &'a Bm25Params) -> Self {
        Self {
            segment,
            stats,
            params,
            postings_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn segment(&self) -> &SegmentReader {
        self.segment
    }

    pub fn stats(&self) -> &IndexStatistics {
        self.stats
    }

    pub fn params(&self) -> &Bm25Params {
        self.params
    }

    /// Decoded postings for a term in this segment, `None` if absent
    pub fn postings(&self, term: &str) -> Result<Option<Arc<Vec<Posting>>>> {
        if let Some(cached) = self.postings_cache.read().get(term) {
            return Ok(cached.clone());
        }

        let postings = self.segment.get_postings(term)?.map(Arc::new);
        self.postings_cache
            .write()
            .insert(term.to_string(), postings.clone());
        Ok(postings)
    }

    /// Docnos containing a term
    pub fn term_bitmap(&self, term: &str) -> Result<RoaringBitmap> {
        let mut bitmap = RoaringBitmap::new();
        if let Some(postings) = self.postings(term)? {
            bitmap.extend(postings.iter().map(|p| p.docno.as_u32()));
        }
        Ok(bitmap)
    }

    /// Term frequency of a term in one document, 0 when absent
    pub fn term_frequency(&self, term: &str, docno: u32) -> Result<u32> {
        Ok(self
            .postings(term)?
            .and_then(|postings| find_posting(&postings, docno).map(|p| p.term_frequency))
            .unwrap_or(0))
    }

    /// Token positions of a term in one document
    pub fn positions(&self, term: &str, docno: u32) -> Result<Option<Vec<u32>>> {
        Ok(self
            .postings(term)?
            .and_then(|postings| find_posting(&postings, docno).map(|p| p.positions.clone())))
    }

    pub fn doc_length(&self, docno: u32) -> u32 {
        self.segment.doc_length(DocNo::new(docno))
    }

    /// BM25+ score of `tf` occurrences of `term` in a document
    pub fn bm25(&self, term: &str, tf: u32, docno: u32) -> f32 {
        self.bm25_with_idf(self.stats.idf(term, self.params), tf, docno)
    }

    /// BM25+ score with an explicit IDF
    pub fn bm25_with_idf(&self, idf: f32, tf: u32, docno: u32) -> f32 {
        self.params
            .score_with_idf(idf, tf, self.doc_length(docno), self.stats.global_avgdl)
    }
}

/// Postings are sorted by docno
pub(crate) fn find_posting(postings: &[Posting], docno: u32) -> Option<&Posting> {
    postings
        .binary_search_by_key(&docno, |p| p.docno.as_u32())
        .ok()
        .map(|idx| &postings[idx])
}
