//! The constructive trace (§3 Trace) and its input fingerprint.

use crate::dep::SourceDep;
use crate::digest::Digest;
use crate::path_key::PathKey;
use crate::volatility::Volatility;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash identifying a trace by its ordered dependency records (and
/// volatility, if present) — excludes the output digest (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Fingerprint(arr))
    }

    /// Compute the fingerprint of a dependency prefix plus optional
    /// volatility. Used both for a committed trace's full fingerprint and,
    /// during a running job, for the *current prefix fingerprint* the
    /// trace recorder checks after every probe (§4.4).
    pub fn of_prefix(deps: &[SourceDep], volatility: Option<Volatility>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for dep in deps {
            hasher.update(dep.path.as_str().as_bytes());
            hasher.update(b"\0");
            hasher.update(&dep.digest.to_hex().into_bytes());
            hasher.update(b"\n");
        }
        match volatility {
            Some(Volatility::Always) => hasher.update(b"volatile-always\n"),
            Some(Volatility::After {
                duration_secs,
                stamped_at,
            }) => {
                hasher.update(format!("volatile-after {duration_secs} {stamped_at}\n").as_bytes())
            }
            None => hasher.update(b""),
        };
        Fingerprint(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identifies a trace uniquely: the rule that produced it, the target it
/// was produced for, and the fingerprint of its ordered inputs (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId {
    pub rule_path: PathKey,
    pub target_path: PathKey,
    pub fingerprint: Fingerprint,
}

/// An ordered sequence of dependency records, optional volatility, and a
/// terminating output digest (§3).
///
/// Invariant 1 (ordering) is the caller's responsibility to uphold: deps
/// must be pushed in the order the rule's probes returned. Invariant 2
/// (immutability) and invariant 3 (output digest present in the content
/// store) are upheld by the trace store, which only ever constructs a
/// `Trace` to write it once, atomically (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub rule_path: PathKey,
    pub target_path: PathKey,
    pub deps: Vec<SourceDep>,
    pub volatility: Option<Volatility>,
    pub output_digest: Digest,
}

impl Trace {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_prefix(&self.deps, self.volatility)
    }

    pub fn trace_id(&self) -> TraceId {
        TraceId {
            rule_path: self.rule_path.clone(),
            target_path: self.target_path.clone(),
            fingerprint: self.fingerprint(),
        }
    }

    /// Whether, as of `now_secs`, this trace's volatility has not expired.
    /// A trace with no volatility record is always within its window.
    pub fn is_within_volatility_window(&self, now_secs: u64) -> bool {
        match self.volatility {
            None => true,
            Some(v) => v.is_valid_at(now_secs),
        }
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
