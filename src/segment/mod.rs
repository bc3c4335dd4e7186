//! Segment-based inverted index
//!
//! Every commit writes immutable segment files; the manifest lists the
//! segments that make up the committed index.
//!
//! # Architecture
//!
//! - `MutableBuffer`: In-memory accumulation of one write batch
//! - `SegmentWriter`: Freezes a buffer into segment artifacts
//! - `SegmentReader`: Immutable, fully loaded segment
//! - `SegmentMerger`: Rewrites segments, dropping documents
//! - `SegmentManifest` / `SegmentStore`: Commit point and on-disk layout

mod buffer;
mod manifest;
mod merge;
mod postings;
mod reader;
mod statistics;
mod store;
mod term_dict;
mod types;
mod writer;

pub use buffer::*;
pub use manifest::*;
pub use merge::*;
pub use postings::*;
pub use reader::*;
pub use statistics::*;
pub use store::*;
pub use term_dict::*;
pub use types::*;
pub use writer::*;
