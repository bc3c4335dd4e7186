//! Prefix query - matches content terms starting with a prefix
//!
//! The prefix is expanded against the segment's FST term dictionary. At most
//! [`MAX_PREFIX_EXPANSIONS`] terms take part per segment, in term order.
//! Matches score a constant equal to the boost.

use roaring::RoaringBitmap;

use crate::highlight::HighlightTerms;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::MAX_PREFIX_EXPANSIONS;
use crate::Result;

/// Query that matches terms starting with a normalized prefix
#[derive(Clone, Debug)]
pub struct PrefixQuery {
    pub prefix: String,
    pub max_expansions: usize,
    pub boost: f32,
}

impl PrefixQuery {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            max_expansions: MAX_PREFIX_EXPANSIONS,
            boost: 1.0,
        }
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    fn expanded_terms(&self, ctx: &QueryContext) -> Vec<String> {
        ctx.segment()
            .terms()
            .prefix_terms(&self.prefix, self.max_expansions)
            .into_iter()
            .map(|(term, _)| term)
            .collect()
    }
}

impl QueryNode for PrefixQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        let mut result = RoaringBitmap::new();
        for term in self.expanded_terms(ctx) {
            result |= ctx.term_bitmap(&term)?;
        }
        Ok(result)
    }

    fn query_type(&self) -> &'static str {
        "prefix"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, docno: u32) -> Result<Option<f32>> {
        for term in self.expanded_terms(ctx) {
            if ctx.term_frequency(&term, docno)? > 0 {
                return Ok(Some(self.boost));
            }
        }
        Ok(None)
    }

    fn collect_highlight_terms(&self, terms: &mut HighlightTerms) {
        terms.add_prefix(&self.prefix, self.max_expansions);
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
