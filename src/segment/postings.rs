//! Postings format
//!
//! A posting list is a vbyte stream:
//!
//! ```text
//! count
//! repeated count times:
//!   docno delta, term frequency, position count, position deltas...
//! ```
//!
//! Docnos and positions are delta-encoded against the previous value in
//! the same list.

use std::io;

use super::types::{DocNo, Posting, PostingListMeta};

/// Variable-byte encoding for integers (commonly used in search engines)
pub fn encode_vbyte(value: u32, output: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            output.push(byte | 0x80); // Set high bit to indicate last byte
            break;
        } else {
            output.push(byte);
        }
    }
}

/// Decode a variable-byte encoded integer
pub fn decode_vbyte(input: &[u8], pos: &mut usize) -> io::Result<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let byte = *input.get(*pos).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "Unexpected end of vbyte")
        })?;
        *pos += 1;

        result |= ((byte & 0x7F) as u32) << shift;

        if byte & 0x80 != 0 {
            return Ok(result);
        }

        shift += 7;
        if shift > 28 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "VByte value too large",
            ));
        }
    }
}

/// Writer for posting lists
#[derive(Default)]
pub struct PostingsWriter {
    /// Encoded postings of the list being built
    current: Vec<u8>,
    /// Number of postings in the list being built
    current_count: u32,
    /// Last docno written to the current list
    last_docno: u32,
    doc_frequency: u32,
    total_term_frequency: u64,
    /// Final output data
    data: Vec<u8>,
}

impl PostingsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start writing a new posting list
    pub fn start_posting_list(&mut self) {
        self.current.clear();
        self.current_count = 0;
        self.last_docno = 0;
        self.doc_frequency = 0;
        self.total_term_frequency = 0;
    }

    /// Add a posting to the current list; docnos must be strictly ascending
    pub fn add_posting(&mut self, posting: &Posting) {
        debug_assert!(self.current_count == 0 || posting.docno.0 > self.last_docno);

        encode_vbyte(posting.docno.0 - self.last_docno, &mut self.current);
        encode_vbyte(posting.term_frequency, &mut self.current);
        encode_vbyte(posting.positions.len() as u32, &mut self.current);

        let mut prev = 0u32;
        for &position in &posting.positions {
            encode_vbyte(position - prev, &mut self.current);
            prev = position;
        }

        self.last_docno = posting.docno.0;
        self.current_count += 1;
        self.doc_frequency += 1;
        self.total_term_frequency += posting.term_frequency as u64;
    }

    /// Finish writing a posting list and return metadata
    pub fn finish_posting_list(&mut self) -> PostingListMeta {
        let offset = self.data.len() as u64;

        encode_vbyte(self.current_count, &mut self.data);
        self.data.extend_from_slice(&self.current);

        PostingListMeta {
            offset,
            length: self.data.len() as u64 - offset,
            doc_frequency: self.doc_frequency,
            total_term_frequency: self.total_term_frequency,
        }
    }

    /// Take the data (consuming the writer)
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Reader for posting lists
#[derive(Debug, Default)]
pub struct PostingsReader {
    data: Vec<u8>,
}

impl PostingsReader {
    /// Create a reader from data
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Decode the posting list described by `meta`
    pub fn get_postings(&self, meta: &PostingListMeta) -> io::Result<Vec<Posting>> {
        let start = meta.offset as usize;
        let end = (meta.offset + meta.length) as usize;

        let slice = self.data.get(start..end).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "Posting list extends beyond data",
            )
        })?;

        decode_posting_list(slice)
    }

    /// Get the underlying data
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn decode_posting_list(data: &[u8]) -> io::Result<Vec<Posting>> {
    let mut pos = 0;
    let count = decode_vbyte(data, &mut pos)? as usize;

    let mut postings = Vec::with_capacity(count);
    let mut docno = 0u32;
    for _ in 0..count {
        docno += decode_vbyte(data, &mut pos)?;
        let term_frequency = decode_vbyte(data, &mut pos)?;
        let position_count = decode_vbyte(data, &mut pos)? as usize;

        let mut positions = Vec::with_capacity(position_count);
        let mut position = 0u32;
        for _ in 0..position_count {
            position += decode_vbyte(data, &mut pos)?;
            positions.push(position);
        }

        postings.push(Posting {
            docno: DocNo(docno),
            term_frequency,
            positions,
        });
    }

    Ok(postings)
}
