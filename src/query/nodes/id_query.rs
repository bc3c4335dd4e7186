//! Id query - exact or prefix match on the stored document id

use roaring::RoaringBitmap;

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;

/// Query that matches documents by their stored id.
///
/// Ids are not analyzed: an exact query compares byte for byte and a prefix
/// query (`id:abc*`) matches every id starting with the given bytes. Matches
/// score a constant equal to the boost.
#[derive(Clone, Debug)]
pub struct IdQuery {
    pub id: String,
    pub prefix: bool,
    pub boost: f32,
}

impl IdQuery {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prefix: false,
            boost: 1.0,
        }
    }

    /// Match every id that starts with `prefix`
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: true,
            ..Self::new(prefix)
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    fn matches(&self, ctx: &QueryContext, docno: u32) -> bool {
        if self.prefix {
            ctx.segment()
                .stored_documents()
                .get(docno as usize)
                .is_some_and(|doc| doc.id.starts_with(&self.id))
        } else {
            ctx.segment()
                .docs_with_id(&self.id)
                .iter()
                .any(|d| d.as_u32() == docno)
        }
    }
}

impl QueryNode for IdQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        let segment = ctx.segment();
        if self.prefix {
            return Ok(segment
                .stored_documents()
                .iter()
                .enumerate()
                .filter(|(_, doc)| doc.id.starts_with(&self.id))
                .map(|(docno, _)| docno as u32)
                .collect());
        }

        Ok(segment
            .docs_with_id(&self.id)
            .iter()
            .map(|docno| docno.as_u32())
            .collect())
    }

    fn query_type(&self) -> &'static str {
        if self.prefix {
            "id_prefix"
        } else {
            "id"
        }
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, docno: u32) -> Result<Option<f32>> {
        Ok(self.matches(ctx, docno).then_some(self.boost))
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
