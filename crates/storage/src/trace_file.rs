//! Line-based trace file format (§6 Filesystem layout):
//!
//! ```text
//! dep <path> <digest>
//! dep-missing <path>
//! volatile-always
//! volatile-after <seconds> <wallclock>
//! output <digest>
//! ```
//!
//! Exactly one `output` line, at the end, for a *committed* trace. A
//! tracefile that is still being written by a running job simply hasn't
//! had its `output` line appended yet.

use crate::error::StoreError;
use redux_core::{Digest, PathKey, SourceDep, Volatility};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// The parsed contents of a trace file, before it's known whether an
/// `output` line is required (tracefile) or mandatory (committed trace).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTraceFile {
    pub deps: Vec<SourceDep>,
    pub volatility: Option<Volatility>,
    pub output: Option<Digest>,
}

pub fn parse(contents: &str, path: &Path) -> Result<ParsedTraceFile, StoreError> {
    let mut parsed = ParsedTraceFile::default();
    for (lineno, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let corrupt = |message: String| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: format!("line {}: {}", lineno + 1, message),
        };
        let mut parts = line.splitn(2, ' ');
        let tag = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");
        match tag {
            "dep" => {
                let mut fields = rest.rsplitn(2, ' ');
                let digest_str = fields.next().ok_or_else(|| corrupt("missing digest".into()))?;
                let path_str = fields.next().ok_or_else(|| corrupt("missing path".into()))?;
                let digest = Digest::from_hex(digest_str)
                    .map_err(|e| corrupt(format!("bad digest: {e}")))?;
                parsed
                    .deps
                    .push(SourceDep::present(PathKey::from_normalized(path_str), digest));
            }
            "dep-missing" => {
                if rest.is_empty() {
                    return Err(corrupt("missing path".into()));
                }
                parsed.deps.push(SourceDep::missing(PathKey::from_normalized(rest)));
            }
            "volatile-always" => {
                parsed.volatility = Some(Volatility::Always);
            }
            "volatile-after" => {
                let mut fields = rest.split(' ');
                let duration: u64 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| corrupt("bad duration".into()))?;
                let stamped_at: u64 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| corrupt("bad wallclock".into()))?;
                parsed.volatility = Some(Volatility::after(duration, stamped_at));
            }
            "output" => {
                let digest = Digest::from_hex(rest).map_err(|e| corrupt(format!("bad digest: {e}")))?;
                parsed.output = Some(digest);
            }
            other => return Err(corrupt(format!("unknown tag '{other}'"))),
        }
    }
    Ok(parsed)
}

fn format_dep(dep: &SourceDep) -> String {
    if dep.digest.is_missing() {
        format!("dep-missing {}\n", dep.path)
    } else {
        format!("dep {} {}\n", dep.path, dep.digest.to_hex())
    }
}

fn format_volatility(v: Volatility) -> String {
    match v {
        Volatility::Always => "volatile-always\n".to_string(),
        Volatility::After {
            duration_secs,
            stamped_at,
        } => format!("volatile-after {duration_secs} {stamped_at}\n"),
    }
}

fn format_output(digest: Digest) -> String {
    format!("output {}\n", digest.to_hex())
}

/// Append-only writer for a running job's tracefile. Each method fsyncs
/// immediately: the tracefile must survive a crash at any point, since the
/// trace recorder (§4.4) relies on its on-disk prefix to decide mid-job
/// cutoff, and the executor relies on it to finalise a commit (§4.3).
pub struct TraceFileWriter {
    file: File,
    path: PathBuf,
    volatility_written: bool,
}

impl TraceFileWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(Self {
            file,
            path,
            volatility_written: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_dep(&mut self, dep: &SourceDep) -> Result<(), StoreError> {
        self.write_line(&format_dep(dep))
    }

    /// Idempotent: a second call with the same or different volatility just
    /// overwrites the in-memory intent — only the first write reaches disk,
    /// since a trace carries at most one volatility record.
    pub fn set_volatility(&mut self, v: Volatility) -> Result<(), StoreError> {
        if self.volatility_written {
            return Ok(());
        }
        self.volatility_written = true;
        self.write_line(&format_volatility(v))
    }

    fn write_line(&mut self, line: &str) -> Result<(), StoreError> {
        self.file
            .write_all(line.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        self.file.sync_data().map_err(|e| StoreError::io(&self.path, e))
    }

    /// Append the terminating `output` line, committing this tracefile's
    /// contents for good (§3 invariant 2).
    pub fn finalize(mut self, output: Digest) -> Result<(), StoreError> {
        self.write_line(&format_output(output))?;
        self.file.sync_all().map_err(|e| StoreError::io(&self.path, e))
    }

    /// Remove the tracefile without committing it (rule failure or
    /// mid-job cutoff kill, §4.3/§4.4).
    pub fn discard(self) -> Result<(), StoreError> {
        drop(self.file);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}

pub fn read_file(path: &Path) -> Result<ParsedTraceFile, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut contents = String::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| StoreError::io(path, e))?;
        contents.push_str(&line);
        contents.push('\n');
    }
    parse(&contents, path)
}

#[cfg(test)]
#[path = "trace_file_tests.rs"]
mod tests;
