//! Content-addressed blob store (§3 Content store, §6 `blobs/<d[0:2]>/<d[2:]>`).
//!
//! Append-only: writes are atomic (temp file + fsync + rename), reads are
//! idempotent, and nothing is ever deleted (GC is explicitly out of scope
//! for the core, §3).

use crate::error::StoreError;
use redux_core::Digest;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open (creating if necessary) a content store rooted at `root`, e.g.
    /// `.git/redux/blobs`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    fn blob_path(&self, digest: Digest) -> Option<PathBuf> {
        let (prefix, rest) = digest.shard_prefix()?;
        Some(self.root.join(prefix).join(rest))
    }

    pub fn contains(&self, digest: Digest) -> bool {
        self.blob_path(digest).is_some_and(|p| p.exists())
    }

    /// Insert a blob's bytes, returning its digest. A no-op (besides the
    /// hash) if the blob is already present — insertion is idempotent.
    pub fn insert_bytes(&self, bytes: &[u8]) -> Result<Digest, StoreError> {
        let digest = Digest::of_bytes(bytes);
        self.ensure_present(digest, |tmp| {
            let mut f = File::create(tmp).map_err(|e| StoreError::io(tmp, e))?;
            f.write_all(bytes).map_err(|e| StoreError::io(tmp, e))?;
            f.sync_all().map_err(|e| StoreError::io(tmp, e))?;
            Ok(())
        })?;
        Ok(digest)
    }

    /// Insert a blob by copying it in from an existing file (the rule's temp
    /// output, per §4.3). The source file is left untouched so the executor
    /// can still rename it into place at the target path.
    pub fn insert_from_file(&self, source: &Path) -> Result<Digest, StoreError> {
        let digest = Digest::of_path(source).map_err(|e| StoreError::io(source, e))?;
        if digest.is_missing() {
            return Err(StoreError::Corrupt {
                path: source.to_path_buf(),
                message: "rule output vanished before it could be hashed".into(),
            });
        }
        self.ensure_present(digest, |tmp| {
            fs::copy(source, tmp).map_err(|e| StoreError::io(tmp, e))?;
            let f = File::open(tmp).map_err(|e| StoreError::io(tmp, e))?;
            f.sync_all().map_err(|e| StoreError::io(tmp, e))?;
            Ok(())
        })?;
        Ok(digest)
    }

    fn ensure_present(
        &self,
        digest: Digest,
        write: impl FnOnce(&Path) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        // Allow expect: every caller hashes real bytes first, so `digest` is
        // never the sentinel `Missing` value here.
        #[allow(clippy::expect_used)]
        let dest = self
            .blob_path(digest)
            .expect("digest from insert_bytes/insert_from_file is never Missing");
        if dest.exists() {
            debug!(digest = %digest, "blob already present, skipping write");
            return Ok(());
        }
        // Allow expect: blob_path always joins at least two shard components.
        #[allow(clippy::expect_used)]
        let dir = dest.parent().expect("blob path always has a shard parent");
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        let tmp = dir.join(format!(".{}.tmp", digest.to_hex()));
        write(&tmp)?;
        fs::rename(&tmp, &dest).map_err(|e| StoreError::io(&dest, e))?;
        debug!(digest = %digest, "blob committed");
        Ok(())
    }

    /// Materialise `digest`'s bytes at `dest`, preferring a hard link
    /// (cheap, and safe because the store is append-only and never mutates
    /// a blob in place) and falling back to a copy across filesystems.
    pub fn materialize(&self, digest: Digest, dest: &Path) -> Result<(), StoreError> {
        let src = self
            .blob_path(digest)
            .ok_or_else(|| StoreError::Corrupt {
                path: dest.to_path_buf(),
                message: "cannot materialize the Missing digest".into(),
            })?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let tmp = dest.with_extension("redux-materialize-tmp");
        let _ = fs::remove_file(&tmp);
        if fs::hard_link(&src, &tmp).is_err() {
            fs::copy(&src, &tmp).map_err(|e| StoreError::io(&tmp, e))?;
        }
        fs::rename(&tmp, dest).map_err(|e| StoreError::io(dest, e))?;
        Ok(())
    }

    pub fn open_reader(&self, digest: Digest) -> Result<File, StoreError> {
        let path = self.blob_path(digest).ok_or_else(|| StoreError::Corrupt {
            path: PathBuf::from("<missing digest>"),
            message: "cannot read the Missing digest".into(),
        })?;
        File::open(&path).map_err(|e| StoreError::io(&path, e))
    }

    pub fn read_to_vec(&self, digest: Digest) -> Result<Vec<u8>, StoreError> {
        let mut f = self.open_reader(digest)?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .map_err(|e| StoreError::io(&self.root, e))?;
        Ok(buf)
    }
}

#[cfg(test)]
#[path = "content_store_tests.rs"]
mod tests;
