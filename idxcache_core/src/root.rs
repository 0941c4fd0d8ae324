//! Cache root discovery, version gating and directory bootstrap.

use crate::error::{Error, Result};
use crate::store::FsIndexStore;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk format version written by this build.
pub const CACHE_VERSION: u32 = 1;

/// Name of the version marker file in the base directory.
pub const VERSION_FILE: &str = "version";

/// Environment variable that overrides the platform cache directory.
pub const CACHE_DIR_ENV: &str = "IDXCACHE_DIR";

const DEFAULT_DIR_NAME: &str = "idxcache";
const INDEX_DIR: &str = "index";
const SNAPSHOTS_DIR: &str = "snapshots";

/// Resolves a base directory when the caller does not supply one.
pub trait CacheDirResolver {
    fn cache_dir(&self) -> Result<PathBuf>;
}

/// Default resolver: `$IDXCACHE_DIR`, else the platform cache directory
/// (`$XDG_CACHE_HOME` or `~/.cache` on Linux) joined with `idxcache`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformDirs;

impl CacheDirResolver for PlatformDirs {
    fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        dirs::cache_dir()
            .map(|dir| dir.join(DEFAULT_DIR_NAME))
            .ok_or_else(|| Error::no_cache_dir("unable to locate the platform cache directory"))
    }
}

/// An opened cache root for one repository.
///
/// Layout:
/// - `<base>/version` holds the format version
/// - `<base>/<repository>/index/` holds one file per cached index
/// - `<base>/<repository>/snapshots/` is reserved
#[derive(Debug, Clone)]
pub struct CacheRoot {
    base: PathBuf,
    repository_id: String,
    path: PathBuf,
}

impl CacheRoot {
    /// Open (and if needed initialise) the cache for `repository_id`.
    ///
    /// When `base` is `None` the directory comes from [`PlatformDirs`].
    pub fn open(repository_id: &str, base: Option<&Path>) -> Result<Self> {
        Self::open_with(repository_id, base, &PlatformDirs)
    }

    /// Open the cache, resolving a missing base directory with `resolver`.
    ///
    /// Fails without touching the filesystem if the version marker is newer
    /// than [`CACHE_VERSION`] or cannot be parsed. Every failure, including
    /// filesystem errors, is an initialization error.
    pub fn open_with(
        repository_id: &str,
        base: Option<&Path>,
        resolver: &dyn CacheDirResolver,
    ) -> Result<Self> {
        validate_repository_id(repository_id)?;

        let base = match base {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => resolver.cache_dir()?,
        };

        let version = read_version(&base).map_err(Error::into_init)?;
        if version > CACHE_VERSION {
            return Err(Error::version_too_new(version, CACHE_VERSION));
        }

        if version < CACHE_VERSION {
            upgrade(&base, version, CACHE_VERSION).map_err(Error::into_init)?;
        }

        let path = base.join(repository_id);
        for sub in [INDEX_DIR, SNAPSHOTS_DIR] {
            create_dir_private(&path.join(sub)).map_err(Error::into_init)?;
        }

        debug!(base = %base.display(), repository = repository_id, "opened cache");

        Ok(Self {
            base,
            repository_id: repository_id.to_string(),
            path,
        })
    }

    /// Base directory holding the version marker.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    /// Repository-scoped directory, `<base>/<repository>`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index_dir(&self) -> PathBuf {
        self.path.join(INDEX_DIR)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.path.join(SNAPSHOTS_DIR)
    }

    /// Build the index store backed by this root.
    pub fn index_store(&self) -> FsIndexStore {
        FsIndexStore::new(self.index_dir())
    }
}

/// Read the version marker in `base`.
///
/// A missing marker (or missing base directory) is version 0.
pub fn read_version(base: &Path) -> Result<u32> {
    let path = base.join(VERSION_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err.into()),
    };

    content
        .trim()
        .parse::<u32>()
        .map_err(|e| Error::invalid_version(&path, format!("{:?}: {}", content.trim(), e)))
}

/// Bring the cache at `base` from version `from` to `to`.
///
/// No version so far changes the layout, so this only rewrites the marker.
/// Layout migrations for later versions must run here before the marker is
/// bumped.
fn upgrade(base: &Path, from: u32, to: u32) -> Result<()> {
    info!(base = %base.display(), from, to, "upgrading cache version marker");
    create_dir_private(base)?;
    write_version(base, to)
}

fn write_version(base: &Path, version: u32) -> Result<()> {
    let mut temp_file = tempfile::NamedTempFile::new_in(base)?;
    write!(temp_file, "{}", version)?;
    temp_file.flush()?;
    temp_file.persist(base.join(VERSION_FILE))?;
    Ok(())
}

fn validate_repository_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_repository_id("repository ID cannot be empty"));
    }

    if id == "." || id.contains("..") || id.contains('/') || id.contains('\\') {
        return Err(Error::invalid_repository_id(format!(
            "{} (must not contain .. or path separators)",
            id
        )));
    }

    Ok(())
}

/// Create `dir` and any missing parents, owner-only on Unix.
pub(crate) fn create_dir_private(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(dir)?;
    Ok(())
}
