//! Parses a make-style `.d` depfile into a flat list of dependency paths
//! (§1: parsing the depfile format is the CLI's job, not the coordinator's —
//! the probe protocol only ever carries already-parsed paths, §4.5).
//!
//! Format handled: `target: dep1 dep2 \` with any number of continuation
//! lines, each ending in an optional trailing backslash. The target itself
//! (everything before the first unescaped colon) is dropped.

use anyhow::{Context, Result};
use std::path::Path;

pub fn parse_depfile(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading depfile {}", path.display()))?;

    let joined = content.replace("\\\n", " ");
    let mut paths = Vec::new();
    for line in joined.lines() {
        let rest = match line.split_once(':') {
            Some((_target, rest)) => rest,
            None => line,
        };
        for token in rest.split_whitespace() {
            paths.push(token.to_string());
        }
    }
    Ok(paths)
}

#[cfg(test)]
#[path = "depfile_tests.rs"]
mod tests;
