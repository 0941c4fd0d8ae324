//! Shared helpers for unit tests.

use crate::error::Error;
use crate::id::{Id, IdSet};
use crate::root::CacheRoot;
use crate::store::{ClearStats, IndexCache};
use std::io::Read;
use tempfile::TempDir;

/// A cache for a random repository in a fresh temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub(crate) fn test_cache() -> (TempDir, CacheRoot) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Id::hash_bytes(temp_dir.path().as_os_str().as_encoded_bytes()).to_hex();
    let root = CacheRoot::open(&repo, Some(temp_dir.path())).unwrap();
    (temp_dir, root)
}

/// Deterministic pseudo-random bytes derived from `seed`.
pub(crate) fn random_blob(seed: u64, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    blake3::Hasher::new()
        .update(&seed.to_le_bytes())
        .finalize_xof()
        .fill(&mut out);
    out
}

/// Deterministic length in `1..=max` derived from `seed`.
pub(crate) fn random_len(seed: u64, max: usize) -> usize {
    let digest = blake3::hash(&seed.to_be_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_le_bytes(word) % max as u64) as usize + 1
}

fn load_all<S: IndexCache>(store: &S, id: &Id) -> Vec<u8> {
    let mut reader = store.load(id).unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).unwrap();
    buf
}

fn load_err<S: IndexCache>(store: &S, id: &Id) -> Error {
    match store.load(id) {
        Ok(_) => panic!("index {} unexpectedly cached", id.short()),
        Err(err) => err,
    }
}

/// Behaviour every [`IndexCache`] implementation must show, starting from
/// an empty store.
pub(crate) fn exercise_index_cache<S: IndexCache>(store: &S) {
    assert!(store.list().unwrap().is_empty());

    let blobs: Vec<(Id, Vec<u8>)> = (0u64..6)
        .map(|seed| {
            let data = random_blob(seed, random_len(seed, 4096));
            (Id::hash_bytes(&data), data)
        })
        .collect();

    for (id, data) in &blobs {
        assert!(!store.has(id));
        assert!(load_err(store, id).is_not_exist());
        store.save(id, &data[..]).unwrap();
        assert!(store.has(id));
    }

    // Round trip and idempotent re-save
    for (id, data) in &blobs {
        assert_eq!(&load_all(store, id), data);
        store.save(id, &data[..]).unwrap();
        assert_eq!(&load_all(store, id), data);
    }

    let all: IdSet = blobs.iter().map(|(id, _)| *id).collect();
    assert_eq!(store.list().unwrap(), all);

    // Clearing with the current listing changes nothing
    let stats = store.clear(&store.list().unwrap()).unwrap();
    assert_eq!(stats, ClearStats { removed: 0, kept: 6 });
    assert_eq!(store.list().unwrap(), all);

    let valid = IdSet::from_iter([blobs[0].0, blobs[2].0]);
    let stats = store.clear(&valid).unwrap();
    assert_eq!(stats, ClearStats { removed: 4, kept: 2 });
    assert_eq!(store.list().unwrap(), valid);

    for (id, _) in &blobs {
        assert_eq!(store.has(id), valid.contains(id));
    }
    assert!(load_err(store, &blobs[1].0).is_not_exist());
    assert_eq!(load_all(store, &blobs[2].0), blobs[2].1);

    store.clear(&IdSet::new()).unwrap();
    assert!(store.list().unwrap().is_empty());
}
