//! Term query - exact match on one normalized content term

use roaring::RoaringBitmap;

use crate::highlight::HighlightTerms;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;

/// Query that matches documents containing an exact normalized term
///
/// The term is expected to be the output of the index tokenizer; the query
/// string parser analyzes user input before building a `TermQuery`.
#[derive(Clone, Debug)]
pub struct TermQuery {
    pub term: String,
    pub boost: f32,
}

impl TermQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl QueryNode for TermQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        ctx.term_bitmap(&self.term)
    }

    fn query_type(&self) -> &'static str {
        "term"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, docno: u32) -> Result<Option<f32>> {
        let tf = ctx.term_frequency(&self.term, docno)?;
        if tf == 0 {
            return Ok(None);
        }
        Ok(Some(ctx.bm25(&self.term, tf, docno) * self.boost))
    }

    fn collect_highlight_terms(&self, terms: &mut HighlightTerms) {
        terms.add_term(&self.term);
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::context::tests::single_segment;

    #[test]
    fn test_term_query_execute() {
        let fixture = single_segment(&["the quick fox", "a lazy dog", "fox and dog"]);
        let ctx = fixture.context();

        let result = TermQuery::new("fox").execute(&ctx).unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![0, 2]);
        assert!(TermQuery::new("cat").execute(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_term_query_score() {
        let fixture = single_segment(&["fox fox cat", "fox cat cat"]);
        let ctx = fixture.context();
        let query = TermQuery::new("fox");

        let twice = query.score(&ctx, 0).unwrap().unwrap();
        let once = query.score(&ctx, 1).unwrap().unwrap();
        assert!(twice > once);
        assert!(once > 0.0);
    }

    #[test]
    fn test_term_query_boost_and_miss() {
        let fixture = single_segment(&["fox", "dog"]);
        let ctx = fixture.context();

        let plain = TermQuery::new("fox").score(&ctx, 0).unwrap().unwrap();
        let boosted = TermQuery::new("fox")
            .with_boost(3.0)
            .score(&ctx, 0)
            .unwrap()
            .unwrap();
        assert!((boosted - plain * 3.0).abs() < 1e-5);
        assert_eq!(TermQuery::new("fox").score(&ctx, 1).unwrap(), None);
    }

    #[test]
    fn test_term_query_highlight_terms() {
        let mut terms = HighlightTerms::default();
        TermQuery::new("rust").collect_highlight_terms(&mut terms);
        assert!(terms.matches("rust"));
        assert!(!terms.matches("rusty"));
    }
}
