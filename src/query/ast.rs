//! Abstract Syntax Tree for query representation
//!
//! Every parsed query is a tree of `QueryNode`s. A node is executed once per
//! segment: `execute` yields the matching docnos as a bitmap and `score`
//! computes the relevance of one matching docno.

use roaring::RoaringBitmap;
use std::fmt::Debug;

use super::context::QueryContext;
use crate::highlight::HighlightTerms;
use crate::Result;

/// Core trait for all query nodes in the AST
pub trait QueryNode: Send + Sync + Debug {
    /// Execute the query against one segment and return the matching docnos
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap>;

    /// Get the query type name for debugging and logging
    fn query_type(&self) -> &'static str;

    /// Get the boost factor for this query
    fn boost(&self) -> f32 {
        1.0
    }

    /// Score a single document.
    ///
    /// Returns `None` when the document does not match this node, so
    /// boolean clauses can tell optional misses from zero scores.
    fn score(&self, ctx: &QueryContext, docno: u32) -> Result<Option<f32>>;

    /// Add the content terms this node matches on to `terms`.
    ///
    /// Prohibited clauses and id clauses contribute nothing.
    fn collect_highlight_terms(&self, _terms: &mut HighlightTerms) {}

    /// Clone this query node into a boxed trait object
    fn clone_box(&self) -> Box<dyn QueryNode>;
}

impl Clone for Box<dyn QueryNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A query that matches no documents
#[derive(Clone, Debug, Default)]
pub struct MatchNoneQuery;

impl QueryNode for MatchNoneQuery {
    fn execute(&self, _ctx: &QueryContext) -> Result<RoaringBitmap> {
        Ok(RoaringBitmap::new())
    }

    fn query_type(&self) -> &'static str {
        "match_none"
    }

    fn score(&self, _ctx: &QueryContext, _docno: u32) -> Result<Option<f32>> {
        Ok(None)
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
