//! Source dependency records (§3 Source dependency record).

use crate::digest::Digest;
use crate::path_key::PathKey;
use serde::{Deserialize, Serialize};

/// States that during a job, the file at `path` was observed to have
/// content digest `digest` — or, via `Digest::Missing`, was observed not to
/// exist. Recorded in the order the running rule's probe calls returned
/// (§5 Ordering guarantees).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDep {
    pub path: PathKey,
    pub digest: Digest,
}

impl SourceDep {
    pub fn present(path: PathKey, digest: Digest) -> Self {
        Self { path, digest }
    }

    pub fn missing(path: PathKey) -> Self {
        Self {
            path,
            digest: Digest::Missing,
        }
    }
}

#[cfg(test)]
#[path = "dep_tests.rs"]
mod tests;
