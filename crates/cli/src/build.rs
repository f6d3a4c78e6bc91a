//! Root build mode (§4.1, §6): the top-level `redux <target>...` invocation
//! that owns a fresh build context — jobserver, content/trace stores, build
//! id — and drives `want`/`want_forced` for each requested target.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use redux_adapters::{DoFileRuleLookup, GitRepositoryAdapter};
use redux_core::{BuildId, PathKey, UuidIdGen};
use redux_engine::{coordinator, BuildContext, EngineConfig, EngineError, Jobserver};
use redux_storage::{ContentStore, TraceStore};
use tracing::info;

use crate::Cli;

pub async fn run(cli: &Cli) -> Result<i32> {
    if cli.whichdo || cli.sources || cli.outputs || cli.howdid || cli.clean {
        bail!(EngineError::InvalidRequest(
            "reporting subcommands are not yet wired to a reporting backend".into()
        )
        .to_string());
    }
    if cli.targets.is_empty() {
        bail!("no targets given");
    }

    let cwd = std::env::current_dir()?;
    let repo = Arc::new(GitRepositoryAdapter::discover(&cwd).await?);
    let repo_root = repo.repo_root().to_path_buf();
    let rules = Arc::new(DoFileRuleLookup::new(repo_root.clone()));
    let config = EngineConfig::load(&repo_root, cli.jobs);
    let content_store = Arc::new(ContentStore::open(config.redux_dir.join("blobs"))?);
    let trace_store = Arc::new(TraceStore::open(config.redux_dir.join("traces"))?);
    let jobserver = Arc::new(Jobserver::create(config.jobs)?);
    let build_id = BuildId::generate(&UuidIdGen);

    info!(build_id = %build_id, jobs = config.jobs, "starting build");
    let ctx = Arc::new(BuildContext::new(
        build_id,
        repo,
        rules,
        content_store,
        trace_store,
        jobserver,
        config,
    ));

    // Run every requested top-level target concurrently: the build context's
    // own memoisation and in-flight coalescing (§4.1) mean a dependency
    // shared by two requested targets is still only ever built once, and the
    // jobserver (§4.6) is what actually bounds concurrent rule processes.
    let mut handles = Vec::with_capacity(cli.targets.len());
    for target in &cli.targets {
        let key = target_path_key(&repo_root, &cwd, target);
        let ctx = ctx.clone();
        let force = cli.force;
        handles.push(tokio::spawn(async move {
            let result = if force {
                coordinator::want_forced(ctx, key.clone()).await
            } else {
                coordinator::want(ctx, key.clone(), None, Vec::new()).await
            };
            (key, result)
        }));
    }

    let mut worst_exit = 0;
    for handle in handles {
        let (key, result) = handle.await?;
        match result {
            Ok(digest) => info!(target = %key, digest = %digest, "built"),
            Err(e) => {
                eprintln!("redux: {key}: {e}");
                worst_exit = worst_exit.max(e.exit_code());
            }
        }
    }
    Ok(worst_exit)
}

/// Resolve a CLI argument (relative to the invoking directory, which may not
/// be the repository root) into a repository-relative [`PathKey`].
fn target_path_key(repo_root: &Path, cwd: &Path, target: &str) -> PathKey {
    let absolute = if Path::new(target).is_absolute() {
        PathBuf::from(target)
    } else {
        cwd.join(target)
    };
    PathKey::normalize(repo_root, absolute)
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
