//! Segment manifest for tracking live segments
//!
//! Commit protocol:
//! 1. Write new segment files, fsync
//! 2. Write manifest.json.tmp, fsync
//! 3. Atomic rename to manifest.json, fsync directory
//! 4. Only then publish the new snapshot to readers
//!
//! The rename in step 3 is the commit point.

use std::io;

use serde::{Deserialize, Serialize};

use super::reader::SegmentMeta;
use super::types::{DocSlot, SegmentId};
use crate::config::TokenizerConfig;
use crate::models::current_timestamp;

/// Manifest entry for a segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Segment metadata
    pub meta: SegmentMeta,
    /// CRC32 of the segment files
    pub checksum: u64,
}

/// The segment manifest tracks all live segments
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentManifest {
    /// Manifest version (for format upgrades)
    pub version: u32,
    /// Generation number (incremented on each commit)
    pub generation: u64,
    /// Next segment ID to allocate
    pub next_segment_id: SegmentId,
    /// Next document slot to assign
    pub next_slot: DocSlot,
    /// Live segments, oldest first
    pub segments: Vec<ManifestEntry>,
    /// Tokenizer the segments were analyzed with
    #[serde(default)]
    pub tokenizer: Option<TokenizerConfig>,
    /// Timestamp of last update
    pub updated_at: u64,
}

impl SegmentManifest {
    /// Current manifest format version
    pub const VERSION: u32 = 1;

    /// Create a new empty manifest
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            generation: 0,
            next_segment_id: SegmentId::new(0),
            next_slot: 0,
            segments: Vec::new(),
            tokenizer: None,
            updated_at: 0,
        }
    }

    /// Allocate a new segment ID
    pub fn allocate_segment_id(&mut self) -> SegmentId {
        let id = self.next_segment_id;
        self.next_segment_id = id.next();
        id
    }

    /// Allocate `count` consecutive slots, returning the first
    pub fn allocate_slots(&mut self, count: u64) -> DocSlot {
        let first = self.next_slot;
        self.next_slot += count;
        first
    }

    /// Add a new segment to the manifest
    pub fn add_segment(&mut self, meta: SegmentMeta, checksum: u64) {
        self.segments.push(ManifestEntry { meta, checksum });
    }

    /// Remove a segment from the manifest
    pub fn remove_segment(&mut self, segment_id: SegmentId) -> Option<ManifestEntry> {
        let pos = self.segments.iter().position(|e| e.meta.id == segment_id)?;
        Some(self.segments.remove(pos))
    }

    /// Drop every segment and restart slot numbering
    pub fn clear(&mut self) -> Vec<ManifestEntry> {
        self.next_slot = 0;
        std::mem::take(&mut self.segments)
    }

    /// Stamp the manifest for the next commit
    pub fn bump_generation(&mut self) {
        self.generation += 1;
        self.updated_at = current_timestamp();
    }

    /// Get total document count across all segments
    pub fn total_doc_count(&self) -> u64 {
        self.segments.iter().map(|e| e.meta.doc_count as u64).sum()
    }

    /// Get segments count
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Check if manifest is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get segment metadata by ID
    pub fn get_segment(&self, segment_id: SegmentId) -> Option<&ManifestEntry> {
        self.segments.iter().find(|e| e.meta.id == segment_id)
    }

    /// Iterate over segment entries
    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.segments.iter()
    }

    /// Serialize the manifest to JSON
    pub fn to_json(&self) -> io::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Deserialize manifest from JSON
    pub fn from_json(data: &[u8]) -> io::Result<Self> {
        let manifest: Self =
            serde_json::from_slice(data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if manifest.version > Self::VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "manifest version {} is newer than supported version {}",
                    manifest.version,
                    Self::VERSION
                ),
            ));
        }
        Ok(manifest)
    }
}

impl Default for SegmentManifest {
    fn default() -> Self {
        Self::new()
    }
}
