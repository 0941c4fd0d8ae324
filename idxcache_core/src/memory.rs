//! In-memory index store.

use crate::error::{Error, Result};
use crate::id::{Id, IdSet};
use crate::store::{ClearStats, IndexCache};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// [`IndexCache`] kept entirely in memory.
///
/// Useful for exercising code built on the trait without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    entries: Mutex<HashMap<Id, Vec<u8>>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Id, Vec<u8>>> {
        // The map is never left half-updated, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IndexCache for MemoryIndexStore {
    type Reader = Cursor<Vec<u8>>;

    fn has(&self, id: &Id) -> bool {
        self.entries().contains_key(id)
    }

    fn load(&self, id: &Id) -> Result<Cursor<Vec<u8>>> {
        self.entries()
            .get(id)
            .cloned()
            .map(Cursor::new)
            .ok_or_else(|| Error::not_cached(id.to_hex()))
    }

    fn save<R: Read>(&self, id: &Id, mut reader: R) -> Result<()> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.entries().insert(*id, data);
        Ok(())
    }

    fn list(&self) -> Result<IdSet> {
        Ok(self.entries().keys().copied().collect())
    }

    fn clear(&self, valid: &IdSet) -> Result<ClearStats> {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|id, _| valid.contains(id));

        Ok(ClearStats {
            removed: before - entries.len(),
            kept: entries.len(),
        })
    }
}
