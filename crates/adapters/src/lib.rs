//! redux-adapters: the external collaborators named in §6 — whatever
//! version-control backend classifies a path as source-vs-generated, and
//! the redo `.do`-file ancestor search that finds a rule for a target.
//!
//! Neither trait cares about constructive traces or caching; they answer
//! exactly one question each, so the engine can be tested against fakes
//! without a real repository on disk.

#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod repository;
pub mod rule_lookup;
pub mod subprocess;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::AdapterError;
pub use repository::{GitRepositoryAdapter, RepositoryAdapter};
pub use rule_lookup::{DoFileRuleLookup, RuleLookup};

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAdapter;
