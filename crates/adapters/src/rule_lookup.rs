//! Rule lookup contract (§6): `find_rule(target) → rule_path or None`,
//! following the standard redo `.do` resolution from the target's directory
//! upward to the repository root.
//!
//! For a target `dir/sub/foo.o`, `dir/sub` is searched first: `foo.o.do`,
//! then `default.o.do` (redo peels exactly the first extension component),
//! then `default.do`. If none exist, the search repeats in `dir`, then in
//! the repository root, considering only the `default*.do` patterns — a
//! directory only ever has an exact-name dofile for targets that live in it
//! directly.

use redux_core::PathKey;
use std::path::PathBuf;

pub trait RuleLookup: Send + Sync {
    fn find_rule(&self, target: &PathKey) -> Option<PathKey>;
}

pub struct DoFileRuleLookup {
    repo_root: PathBuf,
}

impl DoFileRuleLookup {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    fn exists(&self, candidate: &str) -> bool {
        self.repo_root.join(candidate).is_file()
    }
}

fn split_dir_and_name(target: &str) -> (String, String) {
    match target.rsplit_once('/') {
        Some((dir, name)) => (dir.to_string(), name.to_string()),
        None => (String::new(), target.to_string()),
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn parent_dir(dir: &str) -> Option<String> {
    if dir.is_empty() {
        return None;
    }
    match dir.rsplit_once('/') {
        Some((parent, _)) => Some(parent.to_string()),
        None => Some(String::new()),
    }
}

impl RuleLookup for DoFileRuleLookup {
    fn find_rule(&self, target: &PathKey) -> Option<PathKey> {
        let (target_dir, name) = split_dir_and_name(target.as_str());

        // First, in the target's own directory: the exact-name dofile wins.
        let exact = join(&target_dir, &format!("{name}.do"));
        if self.exists(&exact) {
            return Some(PathKey::from_normalized(exact));
        }

        // Then default*.do, searched outward from the target's directory to
        // the repository root.
        let mut dir = Some(target_dir);
        while let Some(current) = dir {
            if let Some((_, ext)) = name.split_once('.') {
                let candidate = join(&current, &format!("default.{ext}.do"));
                if self.exists(&candidate) {
                    return Some(PathKey::from_normalized(candidate));
                }
            }
            let candidate = join(&current, "default.do");
            if self.exists(&candidate) {
                return Some(PathKey::from_normalized(candidate));
            }
            dir = parent_dir(&current);
        }
        None
    }
}

#[cfg(test)]
#[path = "rule_lookup_tests.rs"]
mod tests;
