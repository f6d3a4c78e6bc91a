//! redux-engine: the build coordinator (§4.1), trace recorder and mid-job
//! cutoff (§4.4), job executor (§4.3), dependency-probe protocol (§4.5) and
//! jobserver (§4.6) that together implement `want(target) → digest`.
//!
//! Unlike `redux-core`, `redux-storage` and `redux-adapters`, this crate
//! does not `#![forbid(unsafe_code)]`: [`process`] needs one `pre_exec` call
//! to put a spawned rule into its own process group, and [`jobserver`] needs
//! raw-fd borrowing/ownership to share a token pipe across `fork`/`exec`.
//! Both sites are narrowly commented; nothing else in the crate uses
//! `unsafe`.
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod job;
pub mod jobserver;
pub mod probe;
pub mod process;
pub mod recorder;

pub use config::EngineConfig;
pub use context::BuildContext;
pub use coordinator::{want, want_forced};
pub use error::EngineError;
pub use job::{JobId, JobSpec, Verdict};
pub use jobserver::{JobToken, Jobserver};
pub use recorder::Recorder;
