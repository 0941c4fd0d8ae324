//! Content IDs and ID sets.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::collections::hash_set;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// ID digest size in bytes (256-bit hashes).
pub const ID_SIZE: usize = 32;

/// Length of the canonical hex form of an ID.
pub const ID_HEX_LEN: usize = ID_SIZE * 2;

/// A 32-byte content hash identifying a cached blob.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ID_SIZE]);

impl Id {
    /// Create an Id from raw bytes.
    pub fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Id(bytes)
    }

    /// Create an Id from a hex string (64 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != ID_HEX_LEN {
            return Err(Error::invalid_id(format!(
                "Expected {} hex characters, got {}",
                ID_HEX_LEN,
                hex_str.len()
            )));
        }

        let mut bytes = [0u8; ID_SIZE];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| Error::invalid_id(format!("Invalid hex: {}", e)))?;
        Ok(Id(bytes))
    }

    /// Convert to the canonical lowercase hex string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short form for log lines (first 8 hex characters).
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// Hash raw bytes using BLAKE3.
    pub fn hash_bytes(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Id(*hash.as_bytes())
    }

    /// Hash data from a reader using BLAKE3.
    pub fn hash_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        std::io::copy(&mut reader, &mut hasher)?;
        let hash = hasher.finalize();
        Ok(Id(*hash.as_bytes()))
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Id::from_hex(s)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_hex())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// An unordered set of unique IDs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct IdSet(HashSet<Id>);

impl IdSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an ID. Returns false if it was already present.
    pub fn insert(&mut self, id: Id) -> bool {
        self.0.insert(id)
    }

    /// Remove an ID. Returns false if it was not present.
    pub fn remove(&mut self, id: &Id) -> bool {
        self.0.remove(id)
    }

    /// Membership test.
    pub fn contains(&self, id: &Id) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Id> {
        self.0.iter()
    }

    /// IDs present in both sets.
    pub fn intersection(&self, other: &IdSet) -> IdSet {
        self.0.intersection(&other.0).copied().collect()
    }

    /// IDs in sorted order, for stable display.
    pub fn sorted(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.0.iter().copied().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.sorted().iter().map(|id| id.short()))
            .finish()
    }
}

impl FromIterator<Id> for IdSet {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        IdSet(iter.into_iter().collect())
    }
}

impl Extend<Id> for IdSet {
    fn extend<I: IntoIterator<Item = Id>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for IdSet {
    type Item = Id;
    type IntoIter = hash_set::IntoIter<Id>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a IdSet {
    type Item = &'a Id;
    type IntoIter = hash_set::Iter<'a, Id>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
