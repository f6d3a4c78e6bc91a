//! Error types for the build engine (§7).

use redux_adapters::AdapterError;
use redux_core::PathKey;
use redux_storage::StoreError;
use thiserror::Error;

/// Domain errors from §7, plus the lower crates' errors composed in via
/// `#[from]` so the coordinator can propagate a single error type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no rule to build {0} and it is not a source file")]
    NoRule(PathKey),

    #[error("rule for {target} failed with exit code {exit_code}")]
    RuleFailed { target: PathKey, exit_code: i32 },

    #[error("dependency cycle detected while building {0}")]
    Cycle(PathKey),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("corrupt trace: {0}")]
    CorruptTrace(String),

    #[error("build interrupted")]
    Interrupted,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EngineError {
    /// Best-effort process exit code for the CLI boundary (§10.2).
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::RuleFailed { exit_code, .. } => *exit_code,
            EngineError::Interrupted => 130,
            _ => 1,
        }
    }
}
