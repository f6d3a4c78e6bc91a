//! redux-storage: the two on-disk stores the engine is built around (§3, §6).
//!
//! [`ContentStore`] is the append-only, content-addressed blob store. The
//! [`TraceStore`] is the per-`(rule, target)` history of constructive traces,
//! indexed so the mid-job cutoff check (§4.4) can ask "has any committed
//! trace ever seen this exact dependency prefix" in constant time.

#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod content_store;
pub mod error;
pub mod trace_file;
pub mod trace_store;

pub use content_store::ContentStore;
pub use error::StoreError;
pub use trace_file::{ParsedTraceFile, TraceFileWriter};
pub use trace_store::TraceStore;
