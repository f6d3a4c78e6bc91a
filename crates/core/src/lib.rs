//! redux-core: the data model shared by every other crate in the workspace.
//!
//! Nothing in here touches the filesystem, a child process, or a socket.
//! It defines the vocabulary the rest of the engine is built from: content
//! digests, repository-relative paths, dependency records, volatility, and
//! the constructive trace itself.

#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod build_id;
pub mod clock;
pub mod dep;
pub mod digest;
pub mod id;
pub mod path_key;
pub mod trace;
pub mod volatility;

pub use build_id::BuildId;
pub use clock::{Clock, SystemClock};
pub use dep::SourceDep;
pub use digest::Digest;
pub use id::{IdGen, ShortId, UuidIdGen};
pub use path_key::PathKey;
pub use trace::{Fingerprint, Trace, TraceId};
pub use volatility::Volatility;

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;

#[cfg(any(test, feature = "test-support"))]
pub use id::SequentialIdGen;
