//! Content-addressed index storage.

use crate::error::{Error, Result};
use crate::id::{Id, IdSet};
use serde::Serialize;
use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Counts from a [`IndexCache::clear`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearStats {
    /// Entries deleted because they were not in the valid set.
    pub removed: usize,
    /// Entries left in place.
    pub kept: usize,
}

/// Storage contract for cached index blobs.
///
/// Blobs are opaque: what goes in through [`save`](IndexCache::save) comes
/// back byte for byte from [`load`](IndexCache::load).
pub trait IndexCache {
    /// Reader returned by [`load`](IndexCache::load). Dropping it releases
    /// the underlying handle.
    type Reader: Read;

    /// Returns true if an entry for `id` is present.
    ///
    /// Best effort: failures while probing count as "absent".
    fn has(&self, id: &Id) -> bool;

    /// Open the entry for `id`.
    ///
    /// A missing entry yields an error for which
    /// [`Error::is_not_exist`] is true.
    fn load(&self, id: &Id) -> Result<Self::Reader>;

    /// Store everything `reader` yields as the entry for `id`, replacing any
    /// previous entry.
    fn save<R: Read>(&self, id: &Id, reader: R) -> Result<()>;

    /// IDs of all present entries.
    fn list(&self) -> Result<IdSet>;

    /// Delete every entry whose ID is not in `valid`.
    ///
    /// Stops at the first failed deletion; entries removed before it stay
    /// removed.
    fn clear(&self, valid: &IdSet) -> Result<ClearStats>;
}

/// Index store backed by one file per entry in a directory.
#[derive(Debug, Clone)]
pub struct FsIndexStore {
    dir: PathBuf,
}

impl FsIndexStore {
    /// Create a store over an existing `index/` directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path to the entry file for `id`: `index/{hex}`.
    pub fn entry_path(&self, id: &Id) -> PathBuf {
        self.dir.join(id.to_hex())
    }
}

impl IndexCache for FsIndexStore {
    type Reader = fs::File;

    fn has(&self, id: &Id) -> bool {
        // Same view as list: symlinks are not entries
        fs::symlink_metadata(self.entry_path(id))
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    fn load(&self, id: &Id) -> Result<fs::File> {
        match fs::File::open(self.entry_path(id)) {
            Ok(file) => {
                debug!(id = %id.short(), "loaded cached index");
                Ok(file)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::not_cached(id.to_hex())),
            Err(err) => Err(err.into()),
        }
    }

    /// Written to a temporary file in the index directory first, then
    /// renamed over the entry, so readers never see a partial entry.
    fn save<R: Read>(&self, id: &Id, mut reader: R) -> Result<()> {
        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)?;

        let written = io::copy(&mut reader, &mut temp_file)?;
        temp_file.flush()?;

        temp_file.persist(self.entry_path(id))?;

        debug!(id = %id.short(), bytes = written, "saved index to cache");
        Ok(())
    }

    fn list(&self) -> Result<IdSet> {
        let mut ids = IdSet::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;

            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            match Id::from_hex(name) {
                // Only the canonical lowercase spelling maps back to entry_path
                Ok(id) if id.to_hex() == name => {
                    ids.insert(id);
                }
                _ => trace!(file = name, "skipping non-index file"),
            }
        }

        Ok(ids)
    }

    fn clear(&self, valid: &IdSet) -> Result<ClearStats> {
        let mut stats = ClearStats::default();

        for id in self.list()? {
            if valid.contains(&id) {
                stats.kept += 1;
                continue;
            }

            match fs::remove_file(self.entry_path(&id)) {
                Ok(()) => {}
                // Already gone, e.g. cleared concurrently
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            stats.removed += 1;
        }

        debug!(
            removed = stats.removed,
            kept = stats.kept,
            "cleared stale indexes"
        );
        Ok(stats)
    }
}
