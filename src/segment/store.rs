//! On-disk layout of an index directory
//!
//! ```text
//! <dir>/manifest.json
//! <dir>/write.lock
//! <dir>/seg_<n>/{terms.fst, term_meta.bin, postings.bin, stored.bin, stats.bin}
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tracing::warn;

use super::manifest::{ManifestEntry, SegmentManifest};
use super::postings::PostingsReader;
use super::reader::SegmentReader;
use super::statistics::SegmentStatistics;
use super::term_dict::TermDictionary;
use super::types::{PostingListMeta, SegmentId, StoredDocument};
use super::writer::{segment_checksum, SegmentWriteResult};

pub const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_TMP_FILE: &str = "manifest.json.tmp";
pub const LOCK_FILE: &str = "write.lock";

const TERMS_FILE: &str = "terms.fst";
const TERM_META_FILE: &str = "term_meta.bin";
const POSTINGS_FILE: &str = "postings.bin";
const STORED_FILE: &str = "stored.bin";
const STATS_FILE: &str = "stats.bin";

/// Persistent storage for segment files and manifest.
#[derive(Debug)]
pub struct SegmentStore {
    base_dir: PathBuf,
    sync: bool,
}

impl SegmentStore {
    /// Open (creating if needed) the index directory
    pub fn new<P: AsRef<Path>>(base_dir: P, sync: bool) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            sync,
        })
    }

    /// Take the exclusive directory lock. The lock lives as long as the
    /// returned file and fails with `WouldBlock` while another handle, in
    /// this process or another, holds it.
    pub fn lock(&self) -> io::Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.base_dir.join(LOCK_FILE))?;
        file.try_lock_exclusive().map_err(|e| {
            io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("index directory is already open by another handle or process: {e}"),
            )
        })?;
        Ok(file)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn segment_dir(&self, id: SegmentId) -> PathBuf {
        self.base_dir.join(id.dir_name())
    }

    /// Write every artifact of a segment into its own directory
    pub fn write_segment(&self, result: &SegmentWriteResult) -> io::Result<()> {
        let dir = self.segment_dir(result.reader.id());
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        self.write_file(&dir.join(TERMS_FILE), &result.fst_data)?;
        self.write_file(&dir.join(TERM_META_FILE), &result.term_meta_data)?;
        self.write_file(&dir.join(POSTINGS_FILE), &result.postings_data)?;
        self.write_file(&dir.join(STORED_FILE), &result.stored_data)?;
        self.write_file(&dir.join(STATS_FILE), &result.stats_data)?;

        if self.sync {
            sync_dir(&dir)?;
            sync_dir(&self.base_dir)?;
        }
        Ok(())
    }

    /// Load a segment listed in the manifest, verifying its checksum
    pub fn read_segment(&self, entry: &ManifestEntry) -> io::Result<Arc<SegmentReader>> {
        let dir = self.segment_dir(entry.meta.id);
        let fst_data = fs::read(dir.join(TERMS_FILE))?;
        let term_meta_data = fs::read(dir.join(TERM_META_FILE))?;
        let postings_data = fs::read(dir.join(POSTINGS_FILE))?;
        let stored_data = fs::read(dir.join(STORED_FILE))?;
        let stats_data = fs::read(dir.join(STATS_FILE))?;

        let checksum = segment_checksum(&[
            &fst_data,
            &term_meta_data,
            &postings_data,
            &stored_data,
            &stats_data,
        ]);
        if checksum != entry.checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} checksum mismatch: manifest {:#x}, files {:#x}",
                    entry.meta.id, entry.checksum, checksum
                ),
            ));
        }

        let term_meta: Vec<PostingListMeta> = decode(&term_meta_data)?;
        let stored: Vec<StoredDocument> = decode(&stored_data)?;
        let stats: SegmentStatistics = decode(&stats_data)?;

        let reader = SegmentReader::from_parts(
            entry.meta.clone(),
            TermDictionary::new(fst_data, term_meta)?,
            PostingsReader::new(postings_data),
            stored,
            stats,
        )?;
        Ok(Arc::new(reader))
    }

    /// Delete a segment directory; a missing directory is not an error
    pub fn remove_segment(&self, id: SegmentId) -> io::Result<()> {
        match fs::remove_dir_all(self.segment_dir(id)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Atomically replace the committed manifest.
    ///
    /// The rename is the commit point: once it succeeds the new manifest is
    /// the committed state, so a failing directory sync is only logged.
    pub fn save_manifest(&self, manifest: &SegmentManifest) -> io::Result<()> {
        let bytes = manifest.to_json()?;
        let tmp = self.base_dir.join(MANIFEST_TMP_FILE);
        self.write_file(&tmp, &bytes)?;
        fs::rename(&tmp, self.base_dir.join(MANIFEST_FILE))?;
        if self.sync {
            if let Err(e) = sync_dir(&self.base_dir) {
                warn!(dir = %self.base_dir.display(), error = %e, "failed to sync index directory after commit");
            }
        }
        Ok(())
    }

    /// Load the committed manifest, `None` for a fresh directory
    pub fn load_manifest(&self) -> io::Result<Option<SegmentManifest>> {
        let path = self.base_dir.join(MANIFEST_FILE);
        match fs::read(&path) {
            Ok(bytes) => SegmentManifest::from_json(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove segment directories and temp files the manifest does not
    /// reference. Returns the paths that were removed.
    pub fn cleanup_orphans(&self, manifest: &SegmentManifest) -> io::Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let path = entry.path();

            let result = if name == MANIFEST_TMP_FILE {
                fs::remove_file(&path)
            } else if let Some(id) = SegmentId::from_dir_name(name) {
                if manifest.get_segment(id).is_some() {
                    continue;
                }
                fs::remove_dir_all(&path)
            } else {
                continue;
            };

            match result {
                Ok(()) => removed.push(path),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove orphaned index file"),
            }
        }

        Ok(removed)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> io::Result<T> {
    bincode::deserialize(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
