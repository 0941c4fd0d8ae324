//! Result rendering for idxcache commands.
//!
//! Every command builds a serializable report. With `--json` the report is
//! printed as pretty JSON; otherwise the command's own text summary is used.
//! Failures go to stderr in the same format.

use anyhow::Result;
use idxcache_core::{ClearStats, Id};
use serde::Serialize;
use std::io::{self, Write};

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Prints command reports to stdout.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        Self { format }
    }

    /// Print `report`, or the text from `summary` in text mode.
    pub fn write<T: Serialize>(&self, report: &T, summary: impl FnOnce() -> String) -> Result<()> {
        self.render(&mut io::stdout().lock(), report, summary)
    }

    fn render<W: Write, T: Serialize>(
        &self,
        out: &mut W,
        report: &T,
        summary: impl FnOnce() -> String,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, report)?;
                writeln!(out)?;
            }
            OutputFormat::Text => out.write_all(summary().as_bytes())?,
        }
        out.flush()?;
        Ok(())
    }

    /// Report a failed command on stderr. Output errors are ignored since
    /// there is nowhere left to report them.
    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        let mut stderr = io::stderr().lock();
        let _ = match self.format {
            OutputFormat::Json => {
                let report = ErrorOutput {
                    success: false,
                    result_code,
                    error: format!("{:#}", error),
                };
                serde_json::to_writer_pretty(&mut stderr, &report)
                    .map_err(io::Error::from)
                    .and_then(|()| writeln!(stderr))
            }
            OutputFormat::Text => writeln!(stderr, "idxcache: {:#}", error),
        };
    }
}

/// Error output structure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

/// Output for `init` command.
#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub result_code: u8,
    pub base: String,
    pub path: String,
    pub version: u32,
}

/// Output for `ls` command.
#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub ids: Vec<Id>,
}

/// Output for `has` command.
#[derive(Debug, Serialize)]
pub struct HasOutput {
    pub success: bool,
    pub result_code: u8,
    pub id: Id,
    pub cached: bool,
}

/// Output for `put` command.
#[derive(Debug, Serialize)]
pub struct PutOutput {
    pub success: bool,
    pub result_code: u8,
    pub id: Id,
    pub source: String,
}

/// Output for `prune` command.
#[derive(Debug, Serialize)]
pub struct PruneOutput {
    pub success: bool,
    pub result_code: u8,
    #[serde(flatten)]
    pub stats: ClearStats,
}

/// Output for `version` command.
#[derive(Debug, Serialize)]
pub struct VersionOutput {
    pub success: bool,
    pub result_code: u8,
    pub base: String,
    pub version: u32,
    pub supported: u32,
}
