//! # idxcache core
//!
//! A local, content-addressed cache for encrypted repository index blobs.
//!
//! A backup client keeps copies of the repository's index files on local
//! disk, keyed by their content ID, so unchanged indexes do not have to be
//! fetched from the remote backend again. The cache never looks inside a
//! blob: bytes go in and come back unchanged.
//!
//! ## Layout
//!
//! ```text
//! <base>/version                      format version (decimal text)
//! <base>/<repository>/index/<id hex>  one file per cached index
//! <base>/<repository>/snapshots/      reserved
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use idxcache_core::{CacheRoot, Id, IdSet, IndexCache};
//! use std::io::Read;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let root = CacheRoot::open("5f3c0e7a", None)?;
//! let store = root.index_store();
//!
//! let blob = b"encrypted index bytes";
//! let id = Id::hash_bytes(blob);
//! store.save(&id, &blob[..])?;
//!
//! match store.load(&id) {
//!     Ok(mut reader) => {
//!         let mut buf = Vec::new();
//!         reader.read_to_end(&mut buf)?;
//!     }
//!     Err(err) if err.is_not_exist() => { /* fetch from the backend */ }
//!     Err(err) => return Err(err.into()),
//! }
//!
//! // Drop everything the repository no longer references
//! store.clear(&IdSet::from_iter([id]))?;
//! # Ok(())
//! # }
//! ```

mod error;
mod id;
mod memory;
mod root;
mod store;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result, is_not_exist};
pub use id::{ID_HEX_LEN, ID_SIZE, Id, IdSet};
pub use memory::MemoryIndexStore;
pub use root::{
    CACHE_DIR_ENV, CACHE_VERSION, CacheDirResolver, CacheRoot, PlatformDirs, VERSION_FILE,
    read_version,
};
pub use store::{ClearStats, FsIndexStore, IndexCache};
