//! Posting-level segment merging
//!
//! Merging rewrites one or more segments into a single new segment,
//! optionally dropping documents. Surviving documents keep their slots and
//! are renumbered densely in slot order, so postings and stored fields of
//! the output always agree. Delete-by-id and compaction both go through
//! here, which is why deleted documents never linger as tombstones.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::Arc;

use super::reader::SegmentReader;
use super::statistics::SegmentStatistics;
use super::types::{DocNo, Posting, SegmentId, StoredDocument};
use super::writer::{SegmentWriteResult, SegmentWriter};

/// Merges segments into one, filtering documents on the way
pub struct SegmentMerger<'a> {
    segments: &'a [Arc<SegmentReader>],
}

impl<'a> SegmentMerger<'a> {
    pub fn new(segments: &'a [Arc<SegmentReader>]) -> Self {
        Self { segments }
    }

    /// Merge all documents for which `keep` returns true into `segment_id`.
    ///
    /// Returns `None` when no document survives.
    pub fn merge<F>(&self, segment_id: SegmentId, keep: F) -> io::Result<Option<SegmentWriteResult>>
    where
        F: Fn(&StoredDocument) -> bool,
    {
        // (slot, segment index, old docno) of every surviving document
        let mut survivors: Vec<(u64, usize, DocNo)> = Vec::new();
        for (seg_idx, segment) in self.segments.iter().enumerate() {
            for (docno, doc) in segment.stored_documents().iter().enumerate() {
                if keep(doc) {
                    survivors.push((doc.slot, seg_idx, DocNo::new(docno as u32)));
                }
            }
        }

        if survivors.is_empty() {
            return Ok(None);
        }
        survivors.sort_by_key(|&(slot, _, _)| slot);

        // Old docno -> new docno, per input segment
        let mut remaps: Vec<Vec<Option<DocNo>>> = self
            .segments
            .iter()
            .map(|s| vec![None; s.doc_count() as usize])
            .collect();

        let mut stored = Vec::with_capacity(survivors.len());
        let mut stats = SegmentStatistics::with_capacity(survivors.len());
        for &(_, seg_idx, old_docno) in &survivors {
            let segment = &self.segments[seg_idx];
            let doc = segment.stored(old_docno).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{} has no stored document {}", segment.id(), old_docno.0),
                )
            })?;

            let new_docno = stats.add_document(segment.doc_length(old_docno));
            remaps[seg_idx][old_docno.as_usize()] = Some(new_docno);
            stored.push(doc.clone());
        }

        let mut all_terms: BTreeSet<String> = BTreeSet::new();
        for segment in self.segments {
            all_terms.extend(segment.terms().iter_terms());
        }

        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        for term in all_terms {
            let mut merged: Vec<Posting> = Vec::new();

            for (seg_idx, segment) in self.segments.iter().enumerate() {
                if let Some(postings) = segment.get_postings(&term)? {
                    for posting in postings {
                        let new_docno = remaps[seg_idx]
                            .get(posting.docno.as_usize())
                            .copied()
                            .flatten();
                        if let Some(docno) = new_docno {
                            merged.push(Posting { docno, ..posting });
                        }
                    }
                }
            }

            if !merged.is_empty() {
                merged.sort_by_key(|p| p.docno);
                terms.insert(term, merged);
            }
        }

        SegmentWriter::new(segment_id)
            .assemble(terms, stored, stats)
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::models::Document;
    use crate::segment::MutableBuffer;
    use crate::tokenizer::{StandardTokenizer, Tokenizer};

    fn segment(id: u64, first_slot: u64, docs: &[(&str, &str)]) -> Arc<SegmentReader> {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig::default());
        let mut buffer = MutableBuffer::new();
        for (i, (doc_id, content)) in docs.iter().enumerate() {
            let tokens = tokenizer.tokenize(content);
            buffer.index_document(first_slot + i as u64, &Document::new(*doc_id, *content), &tokens);
        }
        Arc::new(
            SegmentWriter::new(SegmentId::new(id))
                .write_from_buffer(&buffer)
                .unwrap()
                .reader,
        )
    }

    #[test]
    fn test_merge_preserves_slots_and_postings() {
        let segments = vec![
            segment(0, 0, &[("a", "red apple"), ("b", "green apple")]),
            segment(1, 2, &[("c", "red cherry")]),
        ];

        let merged = SegmentMerger::new(&segments)
            .merge(SegmentId::new(2), |_| true)
            .unwrap()
            .unwrap();
        let reader = merged.reader;

        assert_eq!(reader.doc_count(), 3);
        assert_eq!(reader.meta().min_slot, 0);
        assert_eq!(reader.meta().max_slot, 2);
        assert_eq!(reader.doc_frequency("red"), 2);
        assert_eq!(reader.doc_frequency("apple"), 2);

        let red = reader.get_postings("red").unwrap().unwrap();
        assert_eq!(red.iter().map(|p| p.docno).collect::<Vec<_>>(), vec![DocNo(0), DocNo(2)]);
        assert_eq!(reader.stored(DocNo(2)).unwrap().id, "c");
        assert_eq!(reader.doc_length(DocNo(2)), 2);
    }

    #[test]
    fn test_merge_drops_filtered_documents() {
        let segments = vec![segment(0, 0, &[("a", "red apple"), ("b", "green pear"), ("a", "blue")])];

        let reader = SegmentMerger::new(&segments)
            .merge(SegmentId::new(1), |d| d.id != "a")
            .unwrap()
            .unwrap()
            .reader;

        assert_eq!(reader.doc_count(), 1);
        assert_eq!(reader.stored(DocNo(0)).unwrap().slot, 1);
        assert_eq!(reader.doc_frequency("apple"), 0);
        assert_eq!(reader.doc_frequency("blue"), 0);
        assert_eq!(reader.doc_frequency("pear"), 1);
        assert!(reader.docs_with_id("a").is_empty());
    }

    #[test]
    fn test_merge_with_no_survivors() {
        let segments = vec![segment(0, 0, &[("a", "only")])];
        let result = SegmentMerger::new(&segments)
            .merge(SegmentId::new(1), |_| false)
            .unwrap();
        assert!(result.is_none());
    }
}
