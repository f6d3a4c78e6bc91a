//! Repository-relative normalised paths (§3 Path key).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A repository-relative path, normalised so equality is bytewise on the
/// normalised form: no leading `/`, no `.` components, `..` resolved away,
/// and `/` as the separator regardless of host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathKey(String);

impl PathKey {
    /// Normalise an arbitrary path (possibly absolute, possibly containing
    /// `.`/`..`) into a repository-relative key. `base` is the directory the
    /// path is resolved relative to if it isn't already absolute.
    pub fn normalize(base: &Path, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        Self::from_absolute(base, &absolute)
    }

    fn from_absolute(repo_root: &Path, absolute: &Path) -> Self {
        let mut out = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::ParentDir => {
                    out.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
                Component::Normal(part) => out.push(part),
            }
        }
        let relative = out.strip_prefix(strip_to_relative(repo_root)).unwrap_or(&out);
        let s = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        PathKey(s)
    }

    /// Construct directly from an already-relative, already-normal string.
    /// Used when reading a path back out of a trace file.
    pub fn from_normalized(s: impl Into<String>) -> Self {
        PathKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve this key back to an absolute filesystem path under `repo_root`.
    pub fn resolve(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.0)
    }

    /// Escape this path key for use as a single path component in the trace
    /// store directory layout (§6): `/` becomes `%2F`, `%` becomes `%25`.
    pub fn escape_component(&self) -> String {
        self.0.replace('%', "%25").replace('/', "%2F")
    }
}

fn strip_to_relative(repo_root: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in repo_root.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "path_key_tests.rs"]
mod tests;
