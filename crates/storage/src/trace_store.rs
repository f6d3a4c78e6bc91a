//! Trace store (§4.2): `(rule_path, target_path) → ordered set of Trace`,
//! plus the prefix index the mid-job cutoff check (§4.4) needs to turn
//! "does any committed trace share this prefix" into a hash lookup.

use crate::error::StoreError;
use crate::trace_file;
use parking_lot::RwLock;
use redux_core::{Fingerprint, PathKey, SourceDep, Trace};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

type RuleTargetKey = (PathKey, PathKey);

#[derive(Default, Clone)]
struct Bucket {
    /// Newest-first, per §4.2's deterministic ordering (mtime desc, then
    /// fingerprint lexicographic as the tie-break, §9 "Ambiguity: trace
    /// ordering tie-break").
    traces: Vec<Arc<Trace>>,
    /// Fingerprint of every trace's dep-sequence *prefix* (for every
    /// length, not just the full trace) to every trace index sharing it.
    prefix_index: HashMap<Fingerprint, Vec<usize>>,
}

impl Bucket {
    fn index_of(&mut self, idx: usize) {
        let trace = &self.traces[idx];
        for k in 0..=trace.deps.len() {
            let fp = Fingerprint::of_prefix(&trace.deps[..k], None);
            self.prefix_index.entry(fp).or_default().push(idx);
        }
    }

    fn push_sorted(&mut self, trace: Trace, mtime: SystemTime) {
        let idx = self.traces.len();
        self.traces.push(Arc::new(trace));
        self.index_of(idx);
        self.resort(mtime, idx);
    }

    fn resort(&mut self, _new_mtime: SystemTime, _new_idx: usize) {
        // Re-sorting by mtime requires carrying mtimes alongside traces;
        // `load` always sorts the whole bucket from disk, and `insert`
        // only ever adds the newest trace, so appending and re-deriving
        // order from `traces.last()` being newest is sufficient: push the
        // new trace at the front.
        // Allow expect: `insert`, the only caller, always pushes a trace
        // just before calling this, so the vec is never empty here.
        #[allow(clippy::expect_used)]
        let last = self.traces.pop().expect("just pushed");
        self.traces.insert(0, last);
        // prefix_index entries for the moved trace still point at the old
        // index (len - 1); fix them up to 0 and bump every other index.
        for indices in self.prefix_index.values_mut() {
            for i in indices.iter_mut() {
                if *i == self.traces.len() - 1 {
                    *i = 0;
                } else {
                    *i += 1;
                }
            }
        }
    }
}

pub struct TraceStore {
    root: PathBuf,
    cache: RwLock<HashMap<RuleTargetKey, Arc<Bucket>>>,
}

impl TraceStore {
    /// Open (creating if necessary) a trace store rooted at `root`, e.g.
    /// `.git/redux/traces`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self {
            root,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn bucket_dir(&self, rule_path: &PathKey, target_path: &PathKey) -> PathBuf {
        self.root
            .join(rule_path.escape_component())
            .join(target_path.escape_component())
    }

    fn load_bucket(&self, rule_path: &PathKey, target_path: &PathKey) -> Result<Bucket, StoreError> {
        let dir = self.bucket_dir(rule_path, target_path);
        let mut entries: Vec<(Trace, SystemTime, String)> = Vec::new();
        if dir.exists() {
            for entry in fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
                let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let parsed = trace_file::read_file(&path)?;
                let output = parsed.output.ok_or_else(|| StoreError::Corrupt {
                    path: path.clone(),
                    message: "committed trace has no output line".into(),
                })?;
                let trace = Trace {
                    rule_path: rule_path.clone(),
                    target_path: target_path.clone(),
                    deps: parsed.deps,
                    volatility: parsed.volatility,
                    output_digest: output,
                };
                let mtime = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .map_err(|e| StoreError::io(&path, e))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                entries.push((trace, mtime, name));
            }
        }
        // Newest first by mtime, tie-broken by fingerprint (filename) lexicographic.
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.2.cmp(&a.2)));
        let mut bucket = Bucket::default();
        for (trace, _mtime, _name) in entries {
            let idx = bucket.traces.len();
            bucket.traces.push(Arc::new(trace));
            bucket.index_of(idx);
        }
        Ok(bucket)
    }

    fn bucket(&self, rule_path: &PathKey, target_path: &PathKey) -> Result<Arc<Bucket>, StoreError> {
        let key = (rule_path.clone(), target_path.clone());
        if let Some(bucket) = self.cache.read().get(&key) {
            return Ok(bucket.clone());
        }
        let bucket = Arc::new(self.load_bucket(rule_path, target_path)?);
        self.cache.write().insert(key, bucket.clone());
        Ok(bucket)
    }

    /// Candidate traces for `(rule_path, target_path)`, newest-first (§4.1
    /// step 4, §4.2).
    pub fn candidates(
        &self,
        rule_path: &PathKey,
        target_path: &PathKey,
    ) -> Result<Vec<Arc<Trace>>, StoreError> {
        Ok(self.bucket(rule_path, target_path)?.traces.clone())
    }

    /// Committed traces sharing `prefix_deps` as an exact prefix of their
    /// dependency sequence — the mid-job cutoff's hash lookup (§4.4).
    pub fn traces_with_prefix(
        &self,
        rule_path: &PathKey,
        target_path: &PathKey,
        prefix_deps: &[SourceDep],
    ) -> Result<Vec<Arc<Trace>>, StoreError> {
        let bucket = self.bucket(rule_path, target_path)?;
        let fp = Fingerprint::of_prefix(prefix_deps, None);
        let Some(indices) = bucket.prefix_index.get(&fp) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for &idx in indices {
            let trace = &bucket.traces[idx];
            if trace.deps.len() >= prefix_deps.len() && trace.deps[..prefix_deps.len()] == *prefix_deps
            {
                out.push(trace.clone());
            }
        }
        Ok(out)
    }

    /// Atomically write `trace` into the store (§4.2: temp file, fsync,
    /// rename). The caller must have already durably inserted
    /// `trace.output_digest` into the content store (§3 invariant 3).
    pub fn insert(&self, trace: Trace) -> Result<(), StoreError> {
        let dir = self.bucket_dir(&trace.rule_path, &trace.target_path);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let fingerprint = trace.fingerprint();
        let dest = dir.join(fingerprint.to_hex());
        self.write_trace_file(&dest, &trace)?;
        self.remember(trace);
        debug!(path = %dest.display(), "trace committed");
        Ok(())
    }

    /// Finalise an already-written, already-finalized tracefile (the
    /// running job's own tracefile, with its `output` line appended) by
    /// moving it straight into the store (§4.3: "move the tracefile into
    /// the trace store"), avoiding a redundant rewrite.
    pub fn commit_tracefile(
        &self,
        rule_path: &PathKey,
        target_path: &PathKey,
        tracefile_path: &Path,
    ) -> Result<Trace, StoreError> {
        let parsed = trace_file::read_file(tracefile_path)?;
        let output = parsed.output.ok_or_else(|| StoreError::Corrupt {
            path: tracefile_path.to_path_buf(),
            message: "tracefile has no output line to commit".into(),
        })?;
        let trace = Trace {
            rule_path: rule_path.clone(),
            target_path: target_path.clone(),
            deps: parsed.deps,
            volatility: parsed.volatility,
            output_digest: output,
        };
        let dir = self.bucket_dir(rule_path, target_path);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let dest = dir.join(trace.fingerprint().to_hex());
        fs::rename(tracefile_path, &dest).map_err(|e| StoreError::io(&dest, e))?;
        self.remember(trace.clone());
        Ok(trace)
    }

    fn write_trace_file(&self, dest: &Path, trace: &Trace) -> Result<(), StoreError> {
        // Allow expect: `dest` is always `bucket_dir(..).join(fingerprint)`,
        // so it always has a parent.
        #[allow(clippy::expect_used)]
        let dir = dest.parent().expect("trace path always has a parent");
        let tmp = dir.join(format!(".{}.tmp", trace.fingerprint().to_hex()));
        let mut writer = trace_file::TraceFileWriter::create(&tmp)?;
        for dep in &trace.deps {
            writer.append_dep(dep)?;
        }
        if let Some(v) = trace.volatility {
            writer.set_volatility(v)?;
        }
        writer.finalize(trace.output_digest)?;
        fs::rename(&tmp, dest).map_err(|e| StoreError::io(dest, e))
    }

    fn remember(&self, trace: Trace) {
        let key = (trace.rule_path.clone(), trace.target_path.clone());
        let mut cache = self.cache.write();
        let bucket = Arc::make_mut(cache.entry(key).or_insert_with(|| Arc::new(Bucket::default())));
        bucket.push_sorted(trace, SystemTime::now());
    }
}

#[cfg(test)]
#[path = "trace_store_tests.rs"]
mod tests;
