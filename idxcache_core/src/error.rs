//! Error types for idxcache_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using idxcache_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or using a cache.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The requested entry is not in the cache.
    #[error("index {id} is not cached")]
    NotCached { id: String },

    /// Invalid ID format or encoding.
    #[error("Invalid ID: {reason}")]
    InvalidId { reason: String },

    /// The on-disk cache was written by a newer version of this software.
    #[error("cache version is newer: found {found}, supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },

    /// The version marker exists but does not hold a decimal integer.
    #[error("Invalid version marker at {path}: {reason}")]
    InvalidVersion { path: PathBuf, reason: String },

    /// No base directory was given and none could be resolved.
    #[error("No cache directory available: {reason}")]
    NoCacheDir { reason: String },

    /// Repository identity cannot be used as a directory name.
    #[error("Invalid repository ID: {reason}")]
    InvalidRepositoryId { reason: String },

    /// Filesystem failure while preparing the cache root.
    #[error("cache initialization failed: {source}")]
    InitIo {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a NotCached error.
    pub fn not_cached(id: impl Into<String>) -> Self {
        Error::NotCached { id: id.into() }
    }

    /// Create an InvalidId error.
    pub fn invalid_id(reason: impl Into<String>) -> Self {
        Error::InvalidId {
            reason: reason.into(),
        }
    }

    /// Create a VersionTooNew error.
    pub fn version_too_new(found: u32, supported: u32) -> Self {
        Error::VersionTooNew { found, supported }
    }

    /// Create an InvalidVersion error.
    pub fn invalid_version(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidVersion {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a NoCacheDir error.
    pub fn no_cache_dir(reason: impl Into<String>) -> Self {
        Error::NoCacheDir {
            reason: reason.into(),
        }
    }

    /// Create an InvalidRepositoryId error.
    pub fn invalid_repository_id(reason: impl Into<String>) -> Self {
        Error::InvalidRepositoryId {
            reason: reason.into(),
        }
    }

    /// Reclassify a plain I/O failure as an initialization failure.
    pub(crate) fn into_init(self) -> Self {
        match self {
            Error::Io { source } => Error::InitIo { source },
            other => other,
        }
    }

    /// Returns true if the error means the requested entry does not exist.
    ///
    /// Callers use this to tell an expected cache miss apart from a real
    /// failure without inspecting platform error codes. A missing cache
    /// directory is a broken cache, not a miss.
    pub fn is_not_exist(&self) -> bool {
        matches!(self, Error::NotCached { .. })
    }

    /// Returns true for errors raised while opening a cache root.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            Error::VersionTooNew { .. }
                | Error::InvalidVersion { .. }
                | Error::NoCacheDir { .. }
                | Error::InvalidRepositoryId { .. }
                | Error::InitIo { .. }
        )
    }
}

/// Returns true if `err` was caused by a non-existing cache entry.
pub fn is_not_exist(err: &Error) -> bool {
    err.is_not_exist()
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_cached_is_not_exist() {
        let err = Error::not_cached("abcd");
        assert!(err.is_not_exist());
        assert!(is_not_exist(&err));
        assert!(!err.is_initialization());
    }

    #[test]
    fn test_io_not_found_is_not_a_miss() {
        let err: Error = io::Error::from(io::ErrorKind::NotFound).into();
        assert!(!err.is_not_exist());
        assert!(!err.is_initialization());
    }

    #[test]
    fn test_into_init_wraps_io_only() {
        let err: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        let err = err.into_init();
        assert!(matches!(err, Error::InitIo { .. }));
        assert!(err.is_initialization());
        assert!(!err.is_not_exist());

        let err = Error::version_too_new(2, 1).into_init();
        assert!(matches!(err, Error::VersionTooNew { .. }));
    }

    #[test]
    fn test_other_errors_are_not_not_exist() {
        let denied: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert!(!denied.is_not_exist());
        assert!(!Error::version_too_new(2, 1).is_not_exist());
        assert!(!Error::invalid_id("short").is_not_exist());
    }

    #[test]
    fn test_initialization_class() {
        assert!(Error::version_too_new(2, 1).is_initialization());
        assert!(Error::invalid_version("/tmp/version", "not a number").is_initialization());
        assert!(Error::no_cache_dir("unset").is_initialization());
        assert!(Error::invalid_repository_id("empty").is_initialization());
        assert!(!Error::not_cached("abcd").is_initialization());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::version_too_new(3, 1).to_string(),
            "cache version is newer: found 3, supported 1"
        );
        assert_eq!(Error::not_cached("ff").to_string(), "index ff is not cached");
    }
}
