//! Boolean query - combines clauses with AND, OR, NOT semantics

use roaring::RoaringBitmap;

use crate::highlight::HighlightTerms;
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::Occur;
use crate::Result;

/// Boolean query combining multiple clauses
///
/// - `must`: every clause must match. Contributes to score.
/// - `should`: without `must` clauses at least one must match; next to
///   `must` clauses they are optional and only add to the score.
/// - `must_not`: no clause may match. Does not contribute to score.
///
/// A query with only `must_not` clauses matches nothing.
#[derive(Clone, Debug)]
pub struct BoolQuery {
    pub must: Vec<Box<dyn QueryNode>>,
    pub should: Vec<Box<dyn QueryNode>>,
    pub must_not: Vec<Box<dyn QueryNode>>,
    pub boost: f32,
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BoolQuery {
    pub fn new() -> Self {
        Self {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
            boost: 1.0,
        }
    }

    pub fn must(mut self, query: impl QueryNode + 'static) -> Self {
        self.must.push(Box::new(query));
        self
    }

    pub fn should(mut self, query: impl QueryNode + 'static) -> Self {
        self.should.push(Box::new(query));
        self
    }

    pub fn must_not(mut self, query: impl QueryNode + 'static) -> Self {
        self.must_not.push(Box::new(query));
        self
    }

    /// Add a boxed clause with the given occurrence
    pub fn add_boxed(mut self, occur: Occur, query: Box<dyn QueryNode>) -> Self {
        match occur {
            Occur::Must => self.must.push(query),
            Occur::Should => self.should.push(query),
            Occur::MustNot => self.must_not.push(query),
        }
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }
}

impl QueryNode for BoolQuery {
    fn execute(&self, ctx: &QueryContext) -> Result<RoaringBitmap> {
        let mut result: Option<RoaringBitmap> = None;

        for query in &self.must {
            let matches = query.execute(ctx)?;
            let merged = match result {
                Some(r) => r & matches,
                None => matches,
            };
            if merged.is_empty() {
                return Ok(RoaringBitmap::new());
            }
            result = Some(merged);
        }

        if result.is_none() {
            if self.should.is_empty() {
                // nothing positive to match against
                return Ok(RoaringBitmap::new());
            }
            let mut should_matches = RoaringBitmap::new();
            for query in &self.should {
                should_matches |= query.execute(ctx)?;
            }
            result = Some(should_matches);
        }

        let mut result = result.unwrap_or_default();
        for query in &self.must_not {
            if result.is_empty() {
                break;
            }
            result -= query.execute(ctx)?;
        }
        Ok(result)
    }

    fn query_type(&self) -> &'static str {
        "bool"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext, docno: u32) -> Result<Option<f32>> {
        let mut total = 0.0f32;

        for query in &self.must {
            match query.score(ctx, docno)? {
                Some(score) => total += score,
                None => return Ok(None),
            }
        }

        for query in &self.must_not {
            if query.score(ctx, docno)?.is_some() {
                return Ok(None);
            }
        }

        let mut any_should = false;
        for query in &self.should {
            if let Some(score) = query.score(ctx, docno)? {
                total += score;
                any_should = true;
            }
        }

        if self.must.is_empty() && !any_should {
            return Ok(None);
        }
        Ok(Some(total * self.boost))
    }

    fn collect_highlight_terms(&self, terms: &mut HighlightTerms) {
        for query in self.must.iter().chain(&self.should) {
            query.collect_highlight_terms(terms);
        }
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::context::tests::single_segment;
    use crate::query::nodes::TermQuery;

    const DOCS: &[&str] = &["rust search engine", "rust compiler", "search engine", "python"];

    fn docs(query: &BoolQuery) -> Vec<u32> {
        let fixture = single_segment(DOCS);
        let ctx = fixture.context();
        let result = query.execute(&ctx).unwrap();
        // score must agree with execute on every document
        for docno in 0..DOCS.len() as u32 {
            assert_eq!(
                query.score(&ctx, docno).unwrap().is_some(),
                result.contains(docno),
                "docno {docno}"
            );
        }
        result.iter().collect()
    }

    #[test]
    fn test_bool_must() {
        let query = BoolQuery::new()
            .must(TermQuery::new("rust"))
            .must(TermQuery::new("search"));
        assert_eq!(docs(&query), vec![0]);
    }

    #[test]
    fn test_bool_should() {
        let query = BoolQuery::new()
            .should(TermQuery::new("compiler"))
            .should(TermQuery::new("python"));
        assert_eq!(docs(&query), vec![1, 3]);
    }

    #[test]
    fn test_bool_must_not() {
        let query = BoolQuery::new()
            .should(TermQuery::new("search"))
            .must_not(TermQuery::new("rust"));
        assert_eq!(docs(&query), vec![2]);
    }

    #[test]
    fn test_pure_negative_matches_nothing() {
        let query = BoolQuery::new().must_not(TermQuery::new("rust"));
        assert!(docs(&query).is_empty());
        assert!(docs(&BoolQuery::new()).is_empty());
    }

    #[test]
    fn test_should_is_optional_next_to_must() {
        let query = BoolQuery::new()
            .must(TermQuery::new("rust"))
            .should(TermQuery::new("compiler"));
        assert_eq!(docs(&query), vec![0, 1]);

        let fixture = single_segment(DOCS);
        let ctx = fixture.context();
        let with_should = query.score(&ctx, 1).unwrap().unwrap();
        let without = query.score(&ctx, 0).unwrap().unwrap();
        assert!(with_should > without);
    }

    #[test]
    fn test_nested_should_requires_inner_match() {
        let inner = BoolQuery::new()
            .must(TermQuery::new("rust"))
            .must(TermQuery::new("compiler"));
        let query = BoolQuery::new()
            .should(inner)
            .should(TermQuery::new("python"));
        assert_eq!(docs(&query), vec![1, 3]);
    }

    #[test]
    fn test_bool_highlight_terms_skip_prohibited() {
        let query = BoolQuery::new()
            .must(TermQuery::new("rust"))
            .should(TermQuery::new("search"))
            .must_not(TermQuery::new("python"));
        let mut terms = HighlightTerms::default();
        query.collect_highlight_terms(&mut terms);

        assert!(terms.matches("rust"));
        assert!(terms.matches("search"));
        assert!(!terms.matches("python"));
    }

    #[test]
    fn test_bool_query_clone() {
        let query = BoolQuery::new()
            .must(TermQuery::new("rust"))
            .with_boost(2.0);

        let cloned = query.clone_box();
        assert_eq!(cloned.query_type(), "bool");
        assert_eq!(cloned.boost(), 2.0);
    }
}
