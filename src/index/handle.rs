use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::session::IndexWriterSession;
use super::snapshot::{IndexReader, IndexSnapshot};
use crate::config::IndexConfig;
use crate::highlight::{HighlightTerms, Highlighter};
use crate::models::{Document, SearchHit, WriteMode};
use crate::query::{QueryNode, QueryStringParser};
use crate::segment::{SegmentStore, SegmentReader};
use crate::similarity::SimilarityScorer;
use crate::tokenizer::{self, TokenizerRef};
use crate::{LumenError, Result};

/// State shared by every clone of an [`IndexHandle`]
pub(crate) struct IndexShared {
    pub(crate) path: PathBuf,
    pub(crate) name: String,
    pub(crate) config: IndexConfig,
    pub(crate) tokenizer: TokenizerRef,
    pub(crate) highlighter: Highlighter,
    pub(crate) similarity: SimilarityScorer,
    pub(crate) store: SegmentStore,
    pub(crate) snapshot: ArcSwap<IndexSnapshot>,
    pub(crate) writer_lock: Mutex<()>,
    // Released when the last clone drops.
    _dir_lock: File,
}

impl IndexShared {
    pub(crate) fn parse_query(&self, query_text: &str) -> Result<Box<dyn QueryNode>> {
        QueryStringParser::new(query_text, self.tokenizer.as_ref())?
            .with_default_operator(self.config.default_operator)
            .parse()
    }
}

/// A named index on disk
///
/// Cloning is cheap and every clone shares one writer lock and one
/// committed snapshot. A handle holds an exclusive lock on its directory
/// (`write.lock`), so a second `open` of the same directory fails until
/// every clone of the first handle is dropped. Open a directory once and
/// clone the handle.
///
/// # Example
///
/// ```no_run
/// use lumen::{Document, IndexConfig, IndexHandle, WriteMode};
///
/// let index = IndexHandle::open("/var/lib/lumen", "articles", IndexConfig::default())?;
/// index.write(
///     &[Document::new("a1", "The quick brown fox jumps over the lazy dog")],
///     WriteMode::Append,
/// )?;
/// for hit in index.search("fox AND dog", 10)? {
///     println!("{} {:.3} {}", hit.id, hit.score, hit.highlighted_content);
/// }
/// # Ok::<(), lumen::LumenError>(())
/// ```
#[derive(Clone)]
pub struct IndexHandle {
    shared: Arc<IndexShared>,
}

impl IndexHandle {
    /// Open the index `name` under `location`, creating it if absent.
    ///
    /// Fails with [`LumenError::Open`] when the directory cannot be created
    /// or read, another handle holds the directory lock, the manifest is
    /// unreadable, or a segment fails its checksum.
    pub fn open(location: impl AsRef<Path>, name: &str, config: IndexConfig) -> Result<Self> {
        validate_name(name)?;
        let path = location.as_ref().join(name);
        let open_error = |source: io::Error| LumenError::Open {
            path: path.clone(),
            source,
        };

        let store = SegmentStore::new(&path, config.sync_on_commit).map_err(open_error)?;
        let dir_lock = store.lock().map_err(open_error)?;
        let manifest = store.load_manifest().map_err(open_error)?.unwrap_or_default();

        if let Some(stored) = &manifest.tokenizer {
            if stored != &config.tokenizer {
                warn!(
                    path = %path.display(),
                    "tokenizer configuration differs from the one the index was built with"
                );
            }
        }

        let segments = manifest
            .iter()
            .map(|entry| store.read_segment(entry))
            .collect::<io::Result<Vec<Arc<SegmentReader>>>>()
            .map_err(open_error)?;

        match store.cleanup_orphans(&manifest) {
            Ok(removed) if !removed.is_empty() => {
                info!("Removed {} orphaned entries from {}", removed.len(), path.display());
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "orphan cleanup failed"),
        }

        let tokenizer = tokenizer::from_config(&config.tokenizer);
        let snapshot = IndexSnapshot::new(manifest, segments);
        info!(
            "Opened index {} at generation {} ({} docs in {} segments)",
            name,
            snapshot.generation(),
            snapshot.doc_count(),
            snapshot.segment_count()
        );

        Ok(Self {
            shared: Arc::new(IndexShared {
                path,
                name: name.to_string(),
                highlighter: Highlighter::new(tokenizer.clone(), config.highlight.clone()),
                similarity: SimilarityScorer::new(tokenizer.clone()),
                tokenizer,
                config,
                store,
                snapshot: ArcSwap::from_pointee(snapshot),
                writer_lock: Mutex::new(()),
                _dir_lock: dir_lock,
            }),
        })
    }

    /// Index a batch of documents and commit it. Returns the number added.
    ///
    /// `Recreate` replaces everything committed so far with the batch. On
    /// failure nothing of the batch is visible and the previous commit stays
    /// intact.
    pub fn write(&self, documents: &[Document], mode: WriteMode) -> Result<usize> {
        let mut session = self.begin_write()?;
        if mode == WriteMode::Recreate {
            session.recreate();
        }

        let added = session.add_documents(documents).map_err(LumenError::Write)?;
        session.maybe_compact().map_err(LumenError::Write)?;
        if !session.is_dirty() {
            return Ok(0);
        }

        let generation = session.commit().map_err(LumenError::Write)?;
        info!(
            index = %self.shared.name,
            docs = added,
            mode = ?mode,
            generation,
            "committed write batch"
        );
        Ok(added)
    }

    /// Remove every document with this id. Returns the number removed;
    /// zero matches is a successful no-op.
    pub fn delete(&self, id: &str) -> Result<usize> {
        let mut session = self.begin_write()?;
        let removed = session.delete_id(id).map_err(LumenError::Delete)?;
        if removed == 0 {
            return Ok(0);
        }

        let generation = session.commit().map_err(LumenError::Delete)?;
        info!(index = %self.shared.name, id, removed, generation, "committed delete");
        Ok(removed)
    }

    /// Merge all segments into one
    pub fn compact(&self) -> Result<()> {
        let mut session = self.begin_write()?;
        if session.compact().map_err(LumenError::Write)? {
            session.commit().map_err(LumenError::Write)?;
        }
        Ok(())
    }

    /// Start a writer session for batching several mutations into one
    /// commit. Fails with [`LumenError::WriterBusy`] while another session
    /// is open.
    pub fn begin_write(&self) -> Result<IndexWriterSession<'_>> {
        IndexWriterSession::begin(&self.shared)
    }

    /// Search the latest committed snapshot
    pub fn search(&self, query_text: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.reader().search(query_text, limit)
    }

    /// A reader pinned to the current snapshot
    pub fn reader(&self) -> IndexReader {
        IndexReader::new(self.shared.snapshot.load_full(), self.shared.clone())
    }

    /// Highlight the query's terms in arbitrary text.
    ///
    /// There is no segment to expand prefixes against, so a prefix marks
    /// every token that starts with it.
    pub fn highlight(&self, query_text: &str, field_text: &str) -> Result<String> {
        let query = self.shared.parse_query(query_text)?;
        let terms = HighlightTerms::from_query(query.as_ref());
        Ok(self.shared.highlighter.highlight(&terms, field_text))
    }

    /// Cosine similarity of two texts using this index's tokenizer
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        self.shared.similarity.similarity(a, b)
    }

    pub fn doc_count(&self) -> u64 {
        self.shared.snapshot.load().doc_count()
    }

    pub fn segment_count(&self) -> usize {
        self.shared.snapshot.load().segment_count()
    }

    pub fn generation(&self) -> u64 {
        self.shared.snapshot.load().generation()
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &IndexConfig {
        &self.shared.config
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("path", &self.shared.path)
            .field("generation", &self.generation())
            .finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LumenError::InvalidRequest("index name must not be empty".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(LumenError::InvalidRequest(format!(
            "index name '{name}' must be a single path component"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> IndexHandle {
        IndexHandle::open(dir.path(), "test", IndexConfig::default()).unwrap()
    }

    fn docs(items: &[(&str, &str)]) -> Vec<Document> {
        items.iter().map(|(id, content)| Document::new(*id, *content)).collect()
    }

    #[test]
    fn test_write_then_search() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);

        let added = index
            .write(&docs(&[("1", "rust search engine"), ("2", "python web framework")]), WriteMode::Append)
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(index.doc_count(), 2);
        assert_eq!(index.generation(), 1);

        let hits = index.search("rust", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(hits[0].highlighted_content, "<b>rust</b> search engine");
    }

    #[test]
    fn test_invalid_names_rejected() {
        let dir = TempDir::new().unwrap();
        for name in ["", "  ", "..", "a/b", "a\\b"] {
            let err = IndexHandle::open(dir.path(), name, IndexConfig::default()).unwrap_err();
            assert!(matches!(err, LumenError::InvalidRequest(_)), "{name}");
        }
    }

    #[test]
    fn test_empty_append_commits_nothing() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);
        assert_eq!(index.write(&[], WriteMode::Append).unwrap(), 0);
        assert_eq!(index.generation(), 0);
        assert_eq!(index.segment_count(), 0);
    }

    #[test]
    fn test_empty_recreate_wipes() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);
        index.write(&docs(&[("1", "alpha")]), WriteMode::Append).unwrap();

        assert_eq!(index.write(&[], WriteMode::Recreate).unwrap(), 0);
        assert_eq!(index.doc_count(), 0);
        assert_eq!(index.segment_count(), 0);
        assert!(index.search("alpha", 10).unwrap().is_empty());
    }

    #[test]
    fn test_session_holds_writer_lock() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);

        let session = index.begin_write().unwrap();
        let err = index.write(&docs(&[("1", "alpha")]), WriteMode::Append).unwrap_err();
        assert!(matches!(err, LumenError::WriterBusy));
        assert!(err.is_retriable());
        assert!(matches!(index.delete("1"), Err(LumenError::WriterBusy)));
        drop(session);

        assert_eq!(index.write(&docs(&[("1", "alpha")]), WriteMode::Append).unwrap(), 1);
    }

    #[test]
    fn test_lock_timeout_expires() {
        let dir = TempDir::new().unwrap();
        let config = IndexConfig::default().with_writer_lock_timeout_ms(20);
        let index = IndexHandle::open(dir.path(), "test", config).unwrap();

        let _session = index.begin_write().unwrap();
        assert!(matches!(index.compact(), Err(LumenError::WriterBusy)));
    }

    #[test]
    fn test_uncommitted_session_rolls_back_files() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);
        {
            let mut session = index.begin_write().unwrap();
            session.add_documents(&docs(&[("1", "alpha")])).unwrap();
            assert!(index.path().join("seg_0").exists());
        }

        assert!(!index.path().join("seg_0").exists());
        assert_eq!(index.doc_count(), 0);
        assert!(index.search("alpha", 10).unwrap().is_empty());
    }

    #[test]
    fn test_session_batches_into_one_commit() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);
        index.write(&docs(&[("old", "stale text")]), WriteMode::Append).unwrap();

        let mut session = index.begin_write().unwrap();
        session.add_documents(&docs(&[("new", "fresh text")])).unwrap();
        assert_eq!(session.delete_id("old").unwrap(), 1);
        session.commit().unwrap();

        assert_eq!(index.generation(), 2);
        let ids: Vec<String> = index.search("text", 10).unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["new"]);
    }

    #[test]
    fn test_second_open_of_same_directory_fails() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);
        index.write(&docs(&[("1", "alpha")]), WriteMode::Append).unwrap();

        let err = IndexHandle::open(dir.path(), "test", IndexConfig::default()).unwrap_err();
        match &err {
            LumenError::Open { source, .. } => assert_eq!(source.kind(), io::ErrorKind::WouldBlock),
            other => panic!("expected open error, got {other:?}"),
        }

        // clones share the lock; it is released with the last one
        let clone = index.clone();
        drop(index);
        assert!(IndexHandle::open(dir.path(), "test", IndexConfig::default()).is_err());
        assert_eq!(clone.doc_count(), 1);
        drop(clone);

        let reopened = open(&dir);
        assert_eq!(reopened.search("alpha", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_id_is_noop() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);
        index.write(&docs(&[("1", "alpha")]), WriteMode::Append).unwrap();

        assert_eq!(index.delete("nope").unwrap(), 0);
        assert_eq!(index.generation(), 1);
    }

    #[test]
    fn test_highlight_and_similarity() {
        let dir = TempDir::new().unwrap();
        let index = open(&dir);

        let out = index.highlight("lazy dog", "the lazy brown dog").unwrap();
        assert_eq!(out, "the <b>lazy</b> brown <b>dog</b>");
        assert!(index.highlight("\"open", "text").is_err());
        assert_eq!(index.similarity("rust search", "rust search"), 1.0);
    }
}
