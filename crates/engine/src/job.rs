//! The transient per-rule-execution object (§3 Job).

use redux_core::{PathKey, Trace};

redux_core::define_id! {
    /// Identifies one running or finished job within a build, for logging.
    #[derive(Default)]
    pub struct JobId;
}

/// Outcome of running a job to completion (§3, §4.3).
#[derive(Debug, Clone)]
pub enum Verdict {
    CommittedOk(Trace),
    KilledForCacheHit(Trace),
    Failed { exit_code: i32 },
}

/// Identity of the rule execution this job represents: which target it is
/// producing and which dofile is producing it.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: JobId,
    pub rule_path: PathKey,
    pub target_path: PathKey,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
