//! Mutable buffer for in-memory writes
//!
//! A write batch is accumulated here, then frozen into an immutable segment
//! by [`SegmentWriter`](super::SegmentWriter).

use std::collections::HashMap;

use super::statistics::SegmentStatistics;
use super::types::{DocNo, DocSlot, Posting, StoredDocument};
use crate::models::Document;
use crate::tokenizer::Token;

/// In-memory buffer holding one batch of indexed documents
#[derive(Debug, Default)]
pub struct MutableBuffer {
    /// Term to postings mapping; postings are in ascending docno order
    terms: HashMap<String, Vec<Posting>>,
    /// Stored fields indexed by docno
    stored: Vec<StoredDocument>,
    /// Segment statistics
    stats: SegmentStatistics,
}

impl MutableBuffer {
    /// Create a new empty mutable buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new buffer with pre-allocated capacity
    pub fn with_capacity(doc_capacity: usize) -> Self {
        Self {
            terms: HashMap::new(),
            stored: Vec::with_capacity(doc_capacity),
            stats: SegmentStatistics::with_capacity(doc_capacity),
        }
    }

    /// Index a document whose content has already been tokenized
    ///
    /// Returns the assigned DocNo for this document.
    pub fn index_document(&mut self, slot: DocSlot, document: &Document, tokens: &[Token]) -> DocNo {
        let docno = self.stats.add_document(tokens.len() as u32);

        let mut term_positions: HashMap<&str, Vec<u32>> = HashMap::new();
        for token in tokens {
            term_positions
                .entry(token.term.as_str())
                .or_default()
                .push(token.position);
        }

        for (term, positions) in term_positions {
            self.terms
                .entry(term.to_string())
                .or_default()
                .push(Posting::with_positions(docno, positions));
        }

        self.stored.push(StoredDocument {
            slot,
            id: document.id.clone(),
            content: document.content.clone(),
            payload: document.payload.clone(),
        });

        docno
    }

    /// Get postings for a term
    pub fn get_postings(&self, term: &str) -> Option<&Vec<Posting>> {
        self.terms.get(term)
    }

    /// Get document frequency for a term
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.terms.get(term).map(|p| p.len() as u32).unwrap_or(0)
    }

    /// Stored fields of a document
    pub fn stored(&self, docno: DocNo) -> Option<&StoredDocument> {
        self.stored.get(docno.as_usize())
    }

    pub fn all_stored(&self) -> &[StoredDocument] {
        &self.stored
    }

    /// Get all postings
    pub fn all_postings(&self) -> &HashMap<String, Vec<Posting>> {
        &self.terms
    }

    pub fn stats(&self) -> &SegmentStatistics {
        &self.stats
    }

    pub fn doc_count(&self) -> u32 {
        self.stats.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::tokenizer::{StandardTokenizer, Tokenizer};

    fn index(buffer: &mut MutableBuffer, slot: DocSlot, id: &str, content: &str) -> DocNo {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig::default());
        let tokens = tokenizer.tokenize(content);
        buffer.index_document(slot, &Document::new(id, content), &tokens)
    }

    #[test]
    fn test_index_document() {
        let mut buffer = MutableBuffer::new();

        let docno = index(&mut buffer, 7, "a", "hello world hello");
        assert_eq!(docno, DocNo(0));
        assert_eq!(buffer.doc_count(), 1);
        assert_eq!(buffer.stats().get_doc_length(docno), Some(3));

        let postings = buffer.get_postings("hello").unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].term_frequency, 2);
        assert_eq!(postings[0].positions, vec![0, 2]);

        let stored = buffer.stored(docno).unwrap();
        assert_eq!(stored.slot, 7);
        assert_eq!(stored.id, "a");
    }

    #[test]
    fn test_postings_in_docno_order() {
        let mut buffer = MutableBuffer::new();
        index(&mut buffer, 0, "a", "rust search");
        index(&mut buffer, 1, "b", "go");
        index(&mut buffer, 2, "c", "rust");

        let docnos: Vec<_> = buffer
            .get_postings("rust")
            .unwrap()
            .iter()
            .map(|p| p.docno)
            .collect();
        assert_eq!(docnos, vec![DocNo(0), DocNo(2)]);
        assert_eq!(buffer.doc_frequency("go"), 1);
        let slots: Vec<DocSlot> = buffer.all_stored().iter().map(|d| d.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn test_document_without_terms_is_stored() {
        let mut buffer = MutableBuffer::new();
        let docno = index(&mut buffer, 0, "empty", "!!!");
        assert_eq!(buffer.stats().get_doc_length(docno), Some(0));
        assert!(buffer.all_postings().is_empty());
        assert!(!buffer.is_empty());
    }
}
