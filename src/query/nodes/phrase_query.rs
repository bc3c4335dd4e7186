//! Phrase query - matches ordered term sequences with optional slop
//!
//! A phrase query matches documents containing its terms in order. Each term
//! carries its position relative to the first term of the phrase, so gaps
//! left by filtered stopwords are preserved. With `slop = n` the phrase may
//! be stretched by up to `n` extra positions in total.
//!
//! # Example
//!
//! ```rust
//! use lumen::query::PhraseQuery;
//!
//! // "quick brown fox", allowing one inserted token
//! let query = PhraseQuery::new(vec![
//!     ("quick".to_string(), 0),
//!     ("brown".to_string(), 1),
//!     ("fox".to_string(), 2),
//! ])
//! .with_slop(1);
//! ```

use roaring::RoaringBitmap;

use crate::highlight::HighlightTerms;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;

/// Query that matches an ordered phrase of normalized terms
#[derive(Clone, Debug)]
pub struct PhraseQuery {
    /// Terms with their position relative to the first term
    pub terms: Vec<(String, u32)>,
    /// Extra positions the whole phrase may span
    pub slop: u32,
    pub boost: f32,
}

impl PhraseQuery {
    pub fn new(terms: Vec<(String, u32)>) -> Self {
        Self {
            terms,
            slop: 0,
            boost: 1.0,
        }
    }

    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Number of phrase occurrences in one document
    fn phrase_frequency(&self, ctx: &QueryContext, docno: u32) -> Result<u32> {
        let mut positions = Vec::with_capacity(self.terms.len());
        for (term, _) in &self.terms {
            match ctx.positions(term, docno)? {
                Some(p) => positions.push(p),
                None => return Ok(0),
            }
        }

        let offsets: Vec<u32> = self.terms.iter().map(|(_, offset)| *offset).collect();
        Ok(count_phrase_matches(&positions, &offsets, self.slop))
    }
}

/// Count the start positions from which the phrase can be completed in order
/// within `slop` extra positions.
///
/// Each following term takes its earliest occurrence at or after the expected
/// position. The extra distance telescopes to `last - start - last_offset`,
/// so choosing the earliest occurrence at every step minimizes it.
fn count_phrase_matches(positions: &[Vec<u32>], offsets: &[u32], slop: u32) -> u32 {
    let Some(first) = positions.first() else {
        return 0;
    };

    let mut count = 0;
    'starts: for &start in first {
        let mut prev = start;
        for i in 1..positions.len() {
            let gap = offsets[i].saturating_sub(offsets[i - 1]).max(1);
            let want = prev + gap;
            let list = &positions[i];
            let idx = list.partition_point(|&p| p < want);
            let Some(&next) = list.get(idx) else {
                continue 'starts;
            };
            if next - start - offsets[i] > slop {
                continue 'starts;
            }
            prev = next;
        }
        count += 1;
    }
    count
}

impl QueryNode for PhraseQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        let mut candidates: Option<RoaringBitmap> = None;
        for (term, _) in &self.terms {
            let docs = ctx.term_bitmap(term)?;
            let merged = match candidates {
                Some(c) => c & docs,
                None => docs,
            };
            if merged.is_empty() {
                return Ok(RoaringBitmap::new());
            }
            candidates = Some(merged);
        }

        let mut result = RoaringBitmap::new();
        for docno in candidates.unwrap_or_default().iter() {
            if self.phrase_frequency(ctx, docno)? > 0 {
                result.insert(docno);
            }
        }
        Ok(result)
    }

    fn query_type(&self) -> &'static str {
        "phrase"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, docno: u32) -> Result<Option<f32>> {
        let freq = self.phrase_frequency(ctx, docno)?;
        if freq == 0 {
            return Ok(None);
        }

        let idf: f32 = self
            .terms
            .iter()
            .map(|(term, _)| ctx.stats().idf(term, ctx.params()))
            .sum();
        Ok(Some(ctx.bm25_with_idf(idf, freq, docno) * self.boost))
    }

    fn collect_highlight_terms(&self, terms: &mut HighlightTerms) {
        for (term, _) in &self.terms {
            terms.add_term(term);
        }
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
