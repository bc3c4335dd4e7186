//! Segment writer for creating new immutable segments
//!
//! A segment is serialized into five artifacts: the FST term dictionary,
//! the posting list metadata, the postings stream, the stored fields and
//! the per-document statistics.

use std::collections::BTreeMap;
use std::io;

use crc32fast::Hasher;

use super::buffer::MutableBuffer;
use super::postings::{PostingsReader, PostingsWriter};
use super::reader::{SegmentMeta, SegmentReader};
use super::statistics::SegmentStatistics;
use super::term_dict::TermDictionaryBuilder;
use super::types::{Posting, SegmentId, StoredDocument};
use crate::models::current_timestamp;

/// Result of writing a segment
pub struct SegmentWriteResult {
    /// The created segment reader
    pub reader: SegmentReader,
    /// Term dictionary FST data
    pub fst_data: Vec<u8>,
    /// Posting list metadata (bincode)
    pub term_meta_data: Vec<u8>,
    /// Postings data
    pub postings_data: Vec<u8>,
    /// Stored fields (bincode)
    pub stored_data: Vec<u8>,
    /// Statistics (bincode)
    pub stats_data: Vec<u8>,
}

impl SegmentWriteResult {
    /// CRC32 over all persisted segment artifacts, in file order.
    ///
    /// The manifest records this value and it is re-computed on open.
    pub fn checksum(&self) -> u64 {
        segment_checksum(&[
            &self.fst_data,
            &self.term_meta_data,
            &self.postings_data,
            &self.stored_data,
            &self.stats_data,
        ])
    }

    pub fn meta(&self) -> &SegmentMeta {
        self.reader.meta()
    }
}

/// CRC32 over segment artifacts in the fixed file order
pub(crate) fn segment_checksum(parts: &[&[u8]]) -> u64 {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize() as u64
}

/// Writer for creating new segments
pub struct SegmentWriter {
    segment_id: SegmentId,
}

impl SegmentWriter {
    pub fn new(segment_id: SegmentId) -> Self {
        Self { segment_id }
    }

    /// Write a segment from a mutable buffer
    pub fn write_from_buffer(&self, buffer: &MutableBuffer) -> io::Result<SegmentWriteResult> {
        let terms: BTreeMap<String, Vec<Posting>> = buffer
            .all_postings()
            .iter()
            .map(|(term, postings)| (term.clone(), postings.clone()))
            .collect();

        self.assemble(terms, buffer.all_stored().to_vec(), buffer.stats().clone())
    }

    /// Encode sorted posting lists plus stored fields into a segment.
    ///
    /// Posting lists must be in ascending docno order and `stored` must be
    /// indexed by docno.
    pub(crate) fn assemble(
        &self,
        terms: BTreeMap<String, Vec<Posting>>,
        stored: Vec<StoredDocument>,
        stats: SegmentStatistics,
    ) -> io::Result<SegmentWriteResult> {
        let mut postings_writer = PostingsWriter::new();
        let mut term_builder = TermDictionaryBuilder::with_capacity(terms.len());

        for (term, postings) in terms {
            if postings.is_empty() {
                continue;
            }
            postings_writer.start_posting_list();
            for posting in &postings {
                postings_writer.add_posting(posting);
            }
            term_builder.add(term, postings_writer.finish_posting_list());
        }

        let postings_data = postings_writer.into_data();
        let term_dict = term_builder.build()?;

        let fst_data = term_dict.fst_bytes().to_vec();
        let term_meta_data = bincode::serialize(term_dict.metadata())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let stored_data = bincode::serialize(&stored)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let stats_data = bincode::serialize(&stats)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let size_bytes = (fst_data.len()
            + term_meta_data.len()
            + postings_data.len()
            + stored_data.len()
            + stats_data.len()) as u64;

        let meta = SegmentMeta {
            id: self.segment_id,
            doc_count: stored.len() as u32,
            min_slot: stored.first().map(|d| d.slot).unwrap_or(0),
            max_slot: stored.last().map(|d| d.slot).unwrap_or(0),
            size_bytes,
            created_at: current_timestamp(),
        };

        let reader = SegmentReader::from_parts(
            meta,
            term_dict,
            PostingsReader::new(postings_data.clone()),
            stored,
            stats,
        )?;

        Ok(SegmentWriteResult {
            reader,
            fst_data,
            term_meta_data,
            postings_data,
            stored_data,
            stats_data,
        })
    }
}
