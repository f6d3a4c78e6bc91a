//! In-memory stand-ins for [`RepositoryAdapter`] and [`RuleLookup`], used by
//! `redux-engine`'s own unit tests so the coordinator can be exercised
//! without a real git checkout or dofiles on disk.

use crate::error::AdapterError;
use crate::repository::RepositoryAdapter;
use crate::rule_lookup::RuleLookup;
use async_trait::async_trait;
use parking_lot::Mutex;
use redux_core::PathKey;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct FakeAdapter {
    repo_root: PathBuf,
    sources: Mutex<HashSet<PathBuf>>,
    rules: Mutex<HashMap<PathKey, PathKey>>,
}

impl FakeAdapter {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            sources: Mutex::new(HashSet::new()),
            rules: Mutex::new(HashMap::new()),
        }
    }

    pub fn mark_source(&self, path: impl Into<PathBuf>) {
        self.sources.lock().insert(path.into());
    }

    pub fn add_rule(&self, target: PathKey, rule_path: PathKey) {
        self.rules.lock().insert(target, rule_path);
    }
}

#[async_trait]
impl RepositoryAdapter for FakeAdapter {
    async fn is_source(&self, path: &Path) -> Result<bool, AdapterError> {
        Ok(self.sources.lock().contains(path))
    }

    fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

impl RuleLookup for FakeAdapter {
    fn find_rule(&self, target: &PathKey) -> Option<PathKey> {
        self.rules.lock().get(target).cloned()
    }
}
