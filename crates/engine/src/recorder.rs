//! Per-job trace recorder (§4.4): the append-only log of dependency
//! observations a running rule's probes write. The mid-job cutoff check
//! reads this recorder's `deps()` after every probe and hands the prefix to
//! the trace store's own fingerprint lookup.

use redux_core::{SourceDep, Volatility};
use redux_storage::{StoreError, TraceFileWriter};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A job's recorder, shared between the task driving its process and the
/// probe listener appending dependencies the running rule reports (§4.4,
/// §9 "concurrent driver invocations... implement probe handling as
/// synchronous per-job: one probe at a time per tracefile" — the mutex is
/// exactly that serialisation point).
pub type SharedRecorder = Arc<Mutex<Recorder>>;

pub struct Recorder {
    writer: TraceFileWriter,
    deps: Vec<SourceDep>,
    volatility: Option<Volatility>,
}

impl Recorder {
    pub fn create(tracefile_path: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            writer: TraceFileWriter::create(tracefile_path)?,
            deps: Vec::new(),
            volatility: None,
        })
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    /// Append a dependency record in the order the rule's probe call
    /// returned it (§5 ordering guarantee), required for fingerprint
    /// stability.
    pub fn record_dep(&mut self, dep: SourceDep) -> Result<(), StoreError> {
        self.writer.append_dep(&dep)?;
        self.deps.push(dep);
        Ok(())
    }

    pub fn set_volatility(&mut self, v: Volatility) -> Result<(), StoreError> {
        if self.volatility.is_none() {
            self.volatility = Some(v);
        }
        self.writer.set_volatility(v)
    }

    pub fn deps(&self) -> &[SourceDep] {
        &self.deps
    }

    pub fn volatility(&self) -> Option<Volatility> {
        self.volatility
    }

    pub fn finalize(self, output: redux_core::Digest) -> Result<(), StoreError> {
        self.writer.finalize(output)
    }

    pub fn discard(self) -> Result<(), StoreError> {
        self.writer.discard()
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
