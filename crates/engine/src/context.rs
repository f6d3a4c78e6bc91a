//! Per-build shared state (§3 Build context): the *resolved-this-build* and
//! *in-flight* maps `want` uses to memoise work and coalesce concurrent
//! requests, plus the handles every recursive `want` call needs — the
//! stores, the adapters, the jobserver, and the run's configuration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use redux_adapters::{RepositoryAdapter, RuleLookup};
use redux_core::{BuildId, Digest, IdGen, PathKey, UuidIdGen};
use redux_storage::{ContentStore, TraceStore};
use tokio::sync::Notify;

use crate::config::EngineConfig;
use crate::job::{JobId, JobSpec};
use crate::jobserver::Jobserver;

/// Outcome of [`BuildContext::begin_or_await`]: either the caller is now
/// responsible for resolving `target` (and must call `finish_in_flight` when
/// done), or someone else already is and the caller should await the
/// returned [`Notify`] and re-check `resolved`.
pub enum InFlight {
    Owner,
    Waiter(Arc<Notify>),
}

/// Per top-level `redux` invocation. Shared via `Arc` across every `want`
/// call and every job's probe listener spawned during the build.
pub struct BuildContext {
    pub build_id: BuildId,
    pub repo: Arc<dyn RepositoryAdapter>,
    pub rules: Arc<dyn RuleLookup>,
    pub content_store: Arc<ContentStore>,
    pub trace_store: Arc<TraceStore>,
    pub jobserver: Arc<Jobserver>,
    pub config: EngineConfig,
    resolved: Mutex<HashMap<PathKey, Digest>>,
    in_flight: Mutex<HashMap<PathKey, Arc<Notify>>>,
    new_job_id: Arc<dyn Fn() -> JobId + Send + Sync>,
    now_secs: Arc<dyn Fn() -> u64 + Send + Sync>,
}

impl BuildContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        build_id: BuildId,
        repo: Arc<dyn RepositoryAdapter>,
        rules: Arc<dyn RuleLookup>,
        content_store: Arc<ContentStore>,
        trace_store: Arc<TraceStore>,
        jobserver: Arc<Jobserver>,
        config: EngineConfig,
    ) -> Self {
        Self::with_id_gen_and_clock(
            build_id,
            repo,
            rules,
            content_store,
            trace_store,
            jobserver,
            config,
            UuidIdGen,
            redux_core::SystemClock,
        )
    }

    /// Test/production seam: inject a deterministic id generator and clock
    /// instead of `UuidIdGen`/`SystemClock`. `IdGen`/`Clock` are not
    /// object-safe (both require `Clone`), so they're captured in closures
    /// rather than stored as trait objects.
    #[allow(clippy::too_many_arguments)]
    pub fn with_id_gen_and_clock(
        build_id: BuildId,
        repo: Arc<dyn RepositoryAdapter>,
        rules: Arc<dyn RuleLookup>,
        content_store: Arc<ContentStore>,
        trace_store: Arc<TraceStore>,
        jobserver: Arc<Jobserver>,
        config: EngineConfig,
        id_gen: impl IdGen + 'static,
        clock: impl redux_core::Clock + 'static,
    ) -> Self {
        Self {
            build_id,
            repo,
            rules,
            content_store,
            trace_store,
            jobserver,
            config,
            resolved: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            new_job_id: Arc::new(move || JobId::new(id_gen.next())),
            now_secs: Arc::new(move || clock.now_secs()),
        }
    }

    pub fn new_job_id(&self) -> JobId {
        (self.new_job_id)()
    }

    pub fn new_job_spec(&self, rule_path: PathKey, target_path: PathKey) -> JobSpec {
        JobSpec {
            id: self.new_job_id(),
            rule_path,
            target_path,
        }
    }

    pub fn now_secs(&self) -> u64 {
        (self.now_secs)()
    }

    /// §4.1 step 1: already resolved within this build.
    pub fn resolved(&self, target: &PathKey) -> Option<Digest> {
        self.resolved.lock().get(target).copied()
    }

    /// Strict within-build memoisation (§5 "Ordering guarantees"): once set,
    /// a target's digest never changes for the rest of the build.
    pub fn memoize(&self, target: PathKey, digest: Digest) {
        self.resolved.lock().entry(target).or_insert(digest);
    }

    /// Claim `target` as in-flight, or hand back the notifier to wait on if
    /// another worker already claimed it (§4.1 step 1, §5 "Shared mutable
    /// state").
    pub fn begin_or_await(&self, target: &PathKey) -> InFlight {
        let mut in_flight = self.in_flight.lock();
        if let Some(notify) = in_flight.get(target) {
            InFlight::Waiter(notify.clone())
        } else {
            in_flight.insert(target.clone(), Arc::new(Notify::new()));
            InFlight::Owner
        }
    }

    /// Release the in-flight claim and wake every waiter so they re-check
    /// `resolved` (§4.1 step 1).
    pub fn finish_in_flight(&self, target: &PathKey) {
        if let Some(notify) = self.in_flight.lock().remove(target) {
            notify.notify_waiters();
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
