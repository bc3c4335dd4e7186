//! Scoped writer sessions
//!
//! A session holds the writer lock for its whole lifetime and works on a
//! private copy of the committed manifest. Segment files are written as the
//! session goes; nothing becomes visible until [`IndexWriterSession::commit`]
//! replaces the manifest. Dropping an uncommitted session deletes every
//! segment it staged, leaving the previous commit untouched.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::MutexGuard;
use tracing::{debug, info, warn};

use super::handle::IndexShared;
use super::snapshot::IndexSnapshot;
use crate::models::Document;
use crate::segment::{
    MutableBuffer, SegmentId, SegmentManifest, SegmentMerger, SegmentReader, SegmentWriteResult,
    SegmentWriter,
};
use crate::{LumenError, Result};

/// Exclusive, transactional view of an index being mutated
pub struct IndexWriterSession<'a> {
    shared: &'a IndexShared,
    _guard: MutexGuard<'a, ()>,
    manifest: SegmentManifest,
    segments: Vec<Arc<SegmentReader>>,
    /// Segments written by this session, deleted on rollback
    staged: Vec<SegmentId>,
    /// Committed segments this session replaces, deleted after commit
    retired: Vec<SegmentId>,
    dirty: bool,
    committed: bool,
}

impl<'a> IndexWriterSession<'a> {
    /// Acquire the writer lock and start from the latest committed state
    pub(crate) fn begin(shared: &'a IndexShared) -> Result<Self> {
        let guard = match shared.config.writer_lock_timeout_ms {
            None => shared.writer_lock.try_lock(),
            Some(ms) => shared.writer_lock.try_lock_for(Duration::from_millis(ms)),
        };
        let Some(guard) = guard else {
            debug!(path = %shared.path.display(), "writer lock busy");
            return Err(LumenError::WriterBusy);
        };

        let snapshot = shared.snapshot.load_full();
        Ok(Self {
            shared,
            _guard: guard,
            manifest: snapshot.manifest().clone(),
            segments: snapshot.segments().to_vec(),
            staged: Vec::new(),
            retired: Vec::new(),
            dirty: false,
            committed: false,
        })
    }

    /// Whether the session changed anything worth committing
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn doc_count(&self) -> u64 {
        self.manifest.total_doc_count()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Drop every committed segment; slot numbering restarts at zero
    pub fn recreate(&mut self) {
        for entry in self.manifest.clear() {
            self.retire_id(entry.meta.id);
        }
        self.segments.clear();
        self.dirty = true;
    }

    /// Index `documents` into one new segment. Returns the number added.
    pub fn add_documents(&mut self, documents: &[Document]) -> io::Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let first_slot = self.manifest.allocate_slots(documents.len() as u64);
        let mut buffer = MutableBuffer::with_capacity(documents.len());
        for (offset, document) in documents.iter().enumerate() {
            let tokens = self.shared.tokenizer.tokenize(&document.content);
            buffer.index_document(first_slot + offset as u64, document, &tokens);
        }

        let segment_id = self.manifest.allocate_segment_id();
        let result = SegmentWriter::new(segment_id).write_from_buffer(&buffer)?;
        self.stage(result)?;

        debug!(
            segment = segment_id.0,
            docs = documents.len(),
            first_slot,
            "staged segment"
        );
        Ok(documents.len())
    }

    /// Remove every document whose id equals `id`. Returns the number removed.
    ///
    /// Each affected segment is rewritten without those documents, so
    /// postings and stored fields disappear together.
    pub fn delete_id(&mut self, id: &str) -> io::Result<usize> {
        let affected: Vec<Arc<SegmentReader>> = self
            .segments
            .iter()
            .filter(|segment| !segment.docs_with_id(id).is_empty())
            .cloned()
            .collect();

        let mut removed = 0;
        for segment in affected {
            removed += segment.docs_with_id(id).len();
            let new_id = self.manifest.allocate_segment_id();
            let rewritten = SegmentMerger::new(std::slice::from_ref(&segment))
                .merge(new_id, |doc| doc.id != id)?;

            self.retire(segment.id());
            if let Some(result) = rewritten {
                self.stage(result)?;
            }
        }

        if removed > 0 {
            debug!(id, removed, "deleted documents");
        }
        Ok(removed)
    }

    /// Merge all segments into one. Returns false when there was nothing to merge.
    pub fn compact(&mut self) -> io::Result<bool> {
        if self.segments.len() <= 1 {
            return Ok(false);
        }

        let inputs = self.segments.clone();
        let new_id = self.manifest.allocate_segment_id();
        let merged = SegmentMerger::new(&inputs).merge(new_id, |_| true)?;

        for segment in &inputs {
            self.retire(segment.id());
        }
        if let Some(result) = merged {
            self.stage(result)?;
        }

        info!("Compacted {} segments into segment {}", inputs.len(), new_id.0);
        Ok(true)
    }

    /// Compact when the segment count exceeds the configured limit
    pub fn maybe_compact(&mut self) -> io::Result<bool> {
        if self.segments.len() > self.shared.config.max_segments {
            return self.compact();
        }
        Ok(false)
    }

    /// Replace the committed manifest and publish the new snapshot.
    ///
    /// Returns the new generation. Segments retired by this session are
    /// deleted after the manifest rename; a failed deletion is logged and
    /// left to orphan cleanup.
    pub fn commit(mut self) -> io::Result<u64> {
        self.manifest.tokenizer = Some(self.shared.config.tokenizer.clone());
        self.manifest.bump_generation();
        self.shared.store.save_manifest(&self.manifest)?;
        self.committed = true;

        let generation = self.manifest.generation;
        let snapshot = IndexSnapshot::new(self.manifest.clone(), std::mem::take(&mut self.segments));
        self.shared.snapshot.store(Arc::new(snapshot));

        for id in self.retired.drain(..) {
            if let Err(e) = self.shared.store.remove_segment(id) {
                warn!(segment = id.0, error = %e, "failed to remove superseded segment");
            }
        }

        debug!(generation, "committed index generation");
        Ok(generation)
    }

    /// Persist a segment and add it to the session's working set
    fn stage(&mut self, result: SegmentWriteResult) -> io::Result<()> {
        let id = result.meta().id;
        self.staged.push(id);
        self.shared.store.write_segment(&result)?;

        self.manifest.add_segment(result.meta().clone(), result.checksum());
        self.segments.push(Arc::new(result.reader));
        self.dirty = true;
        Ok(())
    }

    fn retire(&mut self, id: SegmentId) {
        self.manifest.remove_segment(id);
        self.segments.retain(|segment| segment.id() != id);
        self.retire_id(id);
        self.dirty = true;
    }

    fn retire_id(&mut self, id: SegmentId) {
        // A segment staged earlier in this session was never committed
        if let Some(pos) = self.staged.iter().position(|staged| *staged == id) {
            self.staged.swap_remove(pos);
            if let Err(e) = self.shared.store.remove_segment(id) {
                warn!(segment = id.0, error = %e, "failed to remove superseded staged segment");
            }
            return;
        }
        self.retired.push(id);
    }
}

impl Drop for IndexWriterSession<'_> {
    fn drop(&mut self) {
        if self.committed || self.staged.is_empty() {
            return;
        }

        for id in &self.staged {
            if let Err(e) = self.shared.store.remove_segment(*id) {
                warn!(segment = id.0, error = %e, "failed to remove staged segment during rollback");
            }
        }
        debug!(staged = self.staged.len(), "rolled back writer session");
    }
}
