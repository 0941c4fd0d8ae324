mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idxcache_core::{
    CACHE_VERSION, CacheDirResolver, CacheRoot, Error, FsIndexStore, Id, IdSet, IndexCache,
    PlatformDirs, read_version,
};
use output::{
    HasOutput, InitOutput, LsOutput, OutputWriter, PruneOutput, PutOutput, VersionOutput,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "IDXCACHE_LOG";

/// idxcache - inspect and maintain a local index cache
#[derive(Parser)]
#[command(name = "idxcache")]
#[command(about = "Local content-addressed cache for repository indexes", long_about = None)]
#[command(version)]
struct Cli {
    /// Cache base directory (defaults to IDXCACHE_DIR or the platform cache dir)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Repository ID the cache belongs to
    #[arg(long, global = true, env = "IDXCACHE_REPO")]
    repo: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the cache, creating and upgrading it as needed
    Init,

    /// List cached index IDs
    Ls,

    /// Check whether an index is cached (exit code 1 if not)
    Has {
        /// Index ID
        id: String,
    },

    /// Write a cached index to stdout
    Cat {
        /// Index ID
        id: String,
    },

    /// Store an index from a file or stdin
    Put {
        /// Index ID
        id: String,

        /// Source file (reads stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Remove every cached index not listed with --keep
    Prune {
        /// IDs to keep
        #[arg(long = "keep", value_name = "ID")]
        keep: Vec<String>,
    },

    /// Show the version marker of the cache base directory
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let out = OutputWriter::new(cli.json);

    match run(&cli, &out) {
        Ok(code) => code,
        Err(err) => {
            let code = error_code(&err);
            out.write_error(&err, code);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli, out: &OutputWriter) -> Result<ExitCode> {
    match &cli.command {
        Commands::Init => cmd_init(out, &open_cache(cli)?),
        Commands::Ls => cmd_ls(out, &open_cache(cli)?.index_store()),
        Commands::Has { id } => cmd_has(out, &open_cache(cli)?.index_store(), id),
        Commands::Cat { id } => cmd_cat(&open_cache(cli)?.index_store(), id),
        Commands::Put { id, file } => {
            cmd_put(out, &open_cache(cli)?.index_store(), id, file.as_deref())
        }
        Commands::Prune { keep } => cmd_prune(out, &open_cache(cli)?.index_store(), keep),
        Commands::Version => cmd_version(out, cli.root.as_deref()),
    }
}

fn open_cache(cli: &Cli) -> Result<CacheRoot> {
    let repo = cli
        .repo
        .as_deref()
        .context("a repository ID is required (use --repo or IDXCACHE_REPO)")?;

    CacheRoot::open(repo, cli.root.as_deref()).with_context(|| match &cli.root {
        Some(root) => format!("Failed to open cache at {}", root.display()),
        None => "Failed to open cache".to_string(),
    })
}

/// Exit code for a failed command: 3 for a cache miss, 4 for an unusable
/// cache root, 2 otherwise.
fn error_code(err: &anyhow::Error) -> u8 {
    match err.chain().find_map(|e| e.downcast_ref::<Error>()) {
        Some(e) if e.is_not_exist() => 3,
        Some(e) if e.is_initialization() => 4,
        _ => 2,
    }
}

fn parse_id(id: &str) -> Result<Id> {
    Id::from_hex(id).with_context(|| format!("Invalid ID: {}", id))
}

fn cmd_init(out: &OutputWriter, cache: &CacheRoot) -> Result<ExitCode> {
    let data = InitOutput {
        success: true,
        result_code: 0,
        base: cache.base().display().to_string(),
        path: cache.path().display().to_string(),
        version: CACHE_VERSION,
    };

    out.write(&data, || {
        format!(
            "Cache ready at {}\nVersion: {}\n",
            cache.path().display(),
            CACHE_VERSION
        )
    })?;

    Ok(ExitCode::SUCCESS)
}

fn cmd_ls(out: &OutputWriter, store: &FsIndexStore) -> Result<ExitCode> {
    let ids = store
        .list()
        .with_context(|| format!("Failed to list {}", store.dir().display()))?
        .sorted();

    let data = LsOutput {
        success: true,
        result_code: 0,
        ids,
    };

    out.write(&data, || {
        data.ids.iter().map(|id| format!("{}\n", id)).collect()
    })?;

    Ok(ExitCode::SUCCESS)
}

fn cmd_has(out: &OutputWriter, store: &FsIndexStore, id: &str) -> Result<ExitCode> {
    let id = parse_id(id)?;
    let cached = store.has(&id);
    let result_code = if cached { 0 } else { 1 };

    let data = HasOutput {
        success: true,
        result_code,
        id,
        cached,
    };

    out.write(&data, || {
        if cached {
            format!("{} is cached\n", id)
        } else {
            format!("{} is not cached\n", id)
        }
    })?;

    Ok(ExitCode::from(result_code))
}

fn cmd_cat(store: &FsIndexStore, id: &str) -> Result<ExitCode> {
    let id = parse_id(id)?;
    let mut reader = store
        .load(&id)
        .with_context(|| format!("Failed to load {}", id))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    io::copy(&mut reader, &mut handle).with_context(|| format!("Failed to output {}", id))?;
    handle.flush()?;

    Ok(ExitCode::SUCCESS)
}

fn cmd_put(
    out: &OutputWriter,
    store: &FsIndexStore,
    id: &str,
    file: Option<&Path>,
) -> Result<ExitCode> {
    let id = parse_id(id)?;

    let source = match file {
        Some(path) => {
            let reader = fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            store
                .save(&id, reader)
                .with_context(|| format!("Failed to save {}", id))?;
            path.display().to_string()
        }
        None => {
            store
                .save(&id, io::stdin().lock())
                .with_context(|| format!("Failed to save {}", id))?;
            "-".to_string()
        }
    };

    let data = PutOutput {
        success: true,
        result_code: 0,
        id,
        source,
    };

    out.write(&data, || format!("Saved {} from {}\n", id, data.source))?;

    Ok(ExitCode::SUCCESS)
}

fn cmd_prune(out: &OutputWriter, store: &FsIndexStore, keep: &[String]) -> Result<ExitCode> {
    let valid = keep
        .iter()
        .map(|id| parse_id(id))
        .collect::<Result<IdSet>>()?;

    let stats = store
        .clear(&valid)
        .with_context(|| "Failed to prune cache")?;

    let data = PruneOutput {
        success: true,
        result_code: 0,
        stats,
    };

    out.write(&data, || {
        format!("Removed {} indexes\nKept {} indexes\n", stats.removed, stats.kept)
    })?;

    Ok(ExitCode::SUCCESS)
}

fn cmd_version(out: &OutputWriter, root: Option<&Path>) -> Result<ExitCode> {
    let base = match root {
        Some(dir) => dir.to_path_buf(),
        None => PlatformDirs
            .cache_dir()
            .context("Failed to resolve cache directory")?,
    };

    let version = read_version(&base)
        .with_context(|| format!("Failed to read version in {}", base.display()))?;

    let data = VersionOutput {
        success: true,
        result_code: 0,
        base: base.display().to_string(),
        version,
        supported: CACHE_VERSION,
    };

    out.write(&data, || {
        format!(
            "Base: {}\nVersion: {}\nSupported: {}\n",
            base.display(),
            version,
            CACHE_VERSION
        )
    })?;

    Ok(ExitCode::SUCCESS)
}
