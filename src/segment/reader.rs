//! Immutable segment reader
//!
//! A segment is fully loaded into memory when opened. Each reader provides
//! access to postings, the term dictionary, stored fields and segment
//! statistics. Readers are shared between snapshots through `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use super::postings::PostingsReader;
use super::statistics::SegmentStatistics;
use super::term_dict::TermDictionary;
use super::types::{DocNo, DocSlot, Posting, SegmentId, StoredDocument};

/// Metadata for a segment stored in the manifest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    /// Unique segment identifier
    pub id: SegmentId,
    /// Number of documents in the segment
    pub doc_count: u32,
    /// Smallest slot stored in the segment
    pub min_slot: DocSlot,
    /// Largest slot stored in the segment
    pub max_slot: DocSlot,
    /// Size in bytes (all segment files combined)
    pub size_bytes: u64,
    /// Creation timestamp
    pub created_at: u64,
}

/// Immutable segment reader backed by in-memory data
pub struct SegmentReader {
    meta: SegmentMeta,
    terms: TermDictionary,
    postings: PostingsReader,
    /// Stored fields indexed by docno, slots ascending
    stored: Vec<StoredDocument>,
    stats: SegmentStatistics,
    /// Stored id -> docnos carrying it
    id_index: HashMap<String, Vec<DocNo>>,
}

impl fmt::Debug for SegmentReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentReader")
            .field("meta", &self.meta)
            .field("terms", &self.terms.len())
            .finish()
    }
}

impl SegmentReader {
    /// Assemble a reader from decoded segment parts
    pub fn from_parts(
        meta: SegmentMeta,
        terms: TermDictionary,
        postings: PostingsReader,
        stored: Vec<StoredDocument>,
        stats: SegmentStatistics,
    ) -> io::Result<Self> {
        if stored.len() != stats.doc_count as usize || stored.len() != meta.doc_count as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{}: {} stored documents, {} in statistics, {} in manifest",
                    meta.id,
                    stored.len(),
                    stats.doc_count,
                    meta.doc_count
                ),
            ));
        }

        let mut id_index: HashMap<String, Vec<DocNo>> = HashMap::new();
        for (docno, doc) in stored.iter().enumerate() {
            id_index
                .entry(doc.id.clone())
                .or_default()
                .push(DocNo::new(docno as u32));
        }

        Ok(Self {
            meta,
            terms,
            postings,
            stored,
            stats,
            id_index,
        })
    }

    /// Get segment metadata
    pub fn meta(&self) -> &SegmentMeta {
        &self.meta
    }

    /// Get segment ID
    pub fn id(&self) -> SegmentId {
        self.meta.id
    }

    /// Get the term dictionary
    pub fn terms(&self) -> &TermDictionary {
        &self.terms
    }

    /// Decode the posting list of a term, `None` if the term is absent
    pub fn get_postings(&self, term: &str) -> io::Result<Option<Vec<Posting>>> {
        match self.terms.get(term) {
            Some(meta) => Ok(Some(self.postings.get_postings(meta)?)),
            None => Ok(None),
        }
    }

    /// Get document frequency for a term
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.terms.get(term).map(|m| m.doc_frequency).unwrap_or(0)
    }

    /// Stored fields of a document
    pub fn stored(&self, docno: DocNo) -> Option<&StoredDocument> {
        self.stored.get(docno.as_usize())
    }

    pub fn stored_documents(&self) -> &[StoredDocument] {
        &self.stored
    }

    /// Docnos of every document stored under `id`
    pub fn docs_with_id(&self, id: &str) -> &[DocNo] {
        self.id_index.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn slot(&self, docno: DocNo) -> Option<DocSlot> {
        self.stored(docno).map(|d| d.slot)
    }

    pub fn doc_length(&self, docno: DocNo) -> u32 {
        self.stats.get_doc_length(docno).unwrap_or(0)
    }

    pub fn stats(&self) -> &SegmentStatistics {
        &self.stats
    }

    pub fn doc_count(&self) -> u32 {
        self.stats.doc_count
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{MutableBuffer, SegmentWriter};
    use crate::config::TokenizerConfig;
    use crate::models::Document;
    use crate::tokenizer::{StandardTokenizer, Tokenizer};

    fn segment(docs: &[(&str, &str)]) -> SegmentReader {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig::default());
        let mut buffer = MutableBuffer::new();
        for (slot, (id, content)) in docs.iter().enumerate() {
            let tokens = tokenizer.tokenize(content);
            buffer.index_document(slot as u64, &Document::new(*id, *content), &tokens);
        }
        SegmentWriter::new(SegmentId::new(0))
            .write_from_buffer(&buffer)
            .unwrap()
            .reader
    }

    #[test]
    fn test_reader_accessors() {
        let reader = segment(&[("a", "quick brown fox"), ("b", "lazy dog"), ("a", "fox again")]);

        assert_eq!(reader.doc_count(), 3);
        assert_eq!(reader.doc_frequency("fox"), 2);
        assert_eq!(reader.doc_frequency("cat"), 0);
        assert_eq!(reader.docs_with_id("a"), &[DocNo(0), DocNo(2)]);
        assert!(reader.docs_with_id("zzz").is_empty());
        assert_eq!(reader.slot(DocNo(1)), Some(1));
        assert_eq!(reader.doc_length(DocNo(0)), 3);

        let postings = reader.get_postings("fox").unwrap().unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[1].docno, DocNo(2));
        assert_eq!(postings[1].positions, vec![0]);
        assert!(reader.get_postings("cat").unwrap().is_none());
    }

    #[test]
    fn test_from_parts_rejects_count_mismatch() {
        let reader = segment(&[("a", "one")]);
        let mut meta = reader.meta().clone();
        meta.doc_count = 5;

        let terms = TermDictionary::new(
            reader.terms().fst_bytes().to_vec(),
            reader.terms().metadata().to_vec(),
        )
        .unwrap();
        let err = SegmentReader::from_parts(
            meta,
            terms,
            PostingsReader::default(),
            reader.stored_documents().to_vec(),
            reader.stats().clone(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
