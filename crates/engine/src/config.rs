//! Layered configuration (§10.3): explicit env var, else a repo-relative
//! default, else a hardcoded fallback.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Conservative default for the trace-replay heuristic bound (§9 "Trace
/// replay cost"), overridable via `$REDUX_REPLAY_BUDGET_MS`.
pub const DEFAULT_REPLAY_BUDGET: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root of the repository metadata area (`traces/`, `blobs/`) — §6.
    pub redux_dir: PathBuf,
    /// Parallelism cap: `-jN` CLI flag, else `$REDUX_JOBS`, else `1`.
    pub jobs: u32,
    /// §9's heuristic bound on mid-job replay validation cost.
    pub replay_budget: Duration,
}

impl EngineConfig {
    /// Resolve `$REDUX_DIR`, falling back to `<repo_root>/.git/redux`.
    pub fn redux_dir(repo_root: &Path) -> PathBuf {
        std::env::var("REDUX_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| repo_root.join(".git").join("redux"))
    }

    /// Resolve the parallelism cap from an explicit CLI flag, else
    /// `$REDUX_JOBS`, else the make-compatible serial default of `1`.
    pub fn jobs(cli_flag: Option<u32>) -> u32 {
        cli_flag
            .or_else(|| std::env::var("REDUX_JOBS").ok().and_then(|s| s.parse().ok()))
            .unwrap_or(1)
    }

    pub fn replay_budget() -> Duration {
        std::env::var("REDUX_REPLAY_BUDGET_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REPLAY_BUDGET)
    }

    pub fn load(repo_root: &Path, jobs_flag: Option<u32>) -> Self {
        Self {
            redux_dir: Self::redux_dir(repo_root),
            jobs: Self::jobs(jobs_flag),
            replay_budget: Self::replay_budget(),
        }
    }
}

/// Environment variables the coordinator passes to a spawned rule's child
/// process (§4.3, §4.5, §6) — never user configuration, always the
/// coordinator's contract with its descendants.
pub const BUILD_ID_VAR: &str = "REDUX_BUILD_ID";
pub const PROBE_SOCK_VAR: &str = "REDUX_PROBE_SOCK";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
