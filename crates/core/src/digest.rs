//! Content digests (§3 Digest).
//!
//! A `Digest` is the identity of a blob of bytes everywhere in the engine:
//! in trace dependency records, as the key into the content store, and as
//! a trace's `output-digest`. Hashing is blake3, chosen for its speed on the
//! whole-file hashing this engine does constantly (every `want()` on a
//! source path re-hashes it) and because the 32-byte digest fits a stable,
//! fixed-width on-disk representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Fixed-width content hash, or the distinguished `MISSING` sentinel meaning
/// "the file did not exist when observed".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digest {
    Present([u8; 32]),
    Missing,
}

impl Digest {
    pub const MISSING: Digest = Digest::Missing;

    /// Hash a byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Digest::Present(*blake3::hash(bytes).as_bytes())
    }

    /// Hash a reader's full contents without buffering it all into one `Vec`
    /// up front (used for large rule outputs and for stdin in `--stamp`).
    pub fn of_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = blake3::Hasher::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Digest::Present(*hasher.finalize().as_bytes()))
    }

    /// Hash a file's contents, treating a missing file as `Digest::Missing`
    /// rather than an I/O error — this is the classification `want()` uses
    /// when observing a source path (§4.1 step 2).
    pub fn of_path(path: &Path) -> std::io::Result<Self> {
        match std::fs::File::open(path) {
            Ok(file) => Self::of_reader(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Digest::Missing),
            Err(e) => Err(e),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Digest::Missing)
    }

    /// Lowercase hex encoding, used for trace file lines and blob paths.
    pub fn to_hex(self) -> String {
        match self {
            Digest::Present(bytes) => hex::encode(bytes),
            Digest::Missing => "missing".to_string(),
        }
    }

    /// Parse the hex encoding written by `to_hex`.
    pub fn from_hex(s: &str) -> Result<Self, DigestParseError> {
        if s == "missing" {
            return Ok(Digest::Missing);
        }
        let bytes = hex::decode(s).map_err(|_| DigestParseError(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| DigestParseError(s.to_string()))?;
        Ok(Digest::Present(arr))
    }

    /// The two-character directory prefix used by the content store's
    /// `blobs/<d[0:2]>/<d[2:]>` sharding (§6). Only meaningful for `Present`.
    pub fn shard_prefix(&self) -> Option<(String, String)> {
        match self {
            Digest::Present(_) => {
                let hex = self.to_hex();
                Some((hex[..2].to_string(), hex[2..].to_string()))
            }
            Digest::Missing => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid digest: {0}")]
pub struct DigestParseError(String);

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", &self.to_hex()[..self.to_hex().len().min(12)])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
