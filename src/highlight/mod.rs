//! Query-aware highlighting of stored content
//!
//! [`HighlightTerms`] is the set of content terms a parsed query matches on;
//! [`Highlighter`] picks the best fragment of a text for those terms and
//! wraps every matched token in the configured tags.
//!
//! Search hits resolve prefixes against the hit's segment with
//! [`HighlightTerms::for_segment`], so only the terms the prefix query
//! actually expanded to are marked. Highlighting free text with no segment
//! behind it marks every token starting with a prefix.

mod highlighter;

use std::collections::HashSet;

pub use highlighter::Highlighter;

use crate::query::QueryNode;
use crate::segment::SegmentReader;

/// Normalized terms and prefixes collected from a query's positive clauses
#[derive(Clone, Debug, Default)]
pub struct HighlightTerms {
    terms: HashSet<String>,
    /// (prefix, expansion cap)
    prefixes: Vec<(String, usize)>,
}

impl HighlightTerms {
    /// Collect the terms of every non-prohibited content clause of `query`
    pub fn from_query(query: &dyn QueryNode) -> Self {
        let mut terms = Self::default();
        query.collect_highlight_terms(&mut terms);
        terms
    }

    pub fn add_term(&mut self, term: &str) {
        self.terms.insert(term.to_string());
    }

    /// Add a prefix that expands to at most `max_expansions` index terms
    pub fn add_prefix(&mut self, prefix: &str, max_expansions: usize) {
        match self.prefixes.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, max)) => *max = (*max).max(max_expansions),
            None => self.prefixes.push((prefix.to_string(), max_expansions)),
        }
    }

    /// Replace every prefix with the terms it expands to in `segment`,
    /// using the same dictionary order and cap as prefix matching
    pub fn for_segment(&self, segment: &SegmentReader) -> Self {
        let mut resolved = Self {
            terms: self.terms.clone(),
            prefixes: Vec::new(),
        };
        for (prefix, max) in &self.prefixes {
            for (term, _) in segment.terms().prefix_terms(prefix, *max) {
                resolved.terms.insert(term);
            }
        }
        resolved
    }

    /// Whether a normalized token term should be marked
    pub fn matches(&self, term: &str) -> bool {
        self.terms.contains(term) || self.prefixes.iter().any(|(p, _)| term.starts_with(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.prefixes.is_empty()
    }
}
