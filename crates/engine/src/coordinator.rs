//! The build coordinator's `want` (§4.1): dedup → classify → probe cache →
//! run a job on miss. Recursive in the build graph, so every call is boxed
//! (`futures::future::BoxFuture`) to avoid an infinitely-sized future type —
//! the same shape pantsbuild's engine uses for its own recursive graph
//! resolution.

use std::sync::Arc;

use futures::future::BoxFuture;
use redux_core::{Digest, PathKey, SourceDep, Trace};
use tracing::{debug, info, instrument};

use crate::context::{BuildContext, InFlight};
use crate::error::EngineError;
use crate::job::Verdict;
use crate::recorder::SharedRecorder;

/// Resolve `target` to its current content digest, recording the dependency
/// into `caller`'s tracefile (if any) on success. `ancestors` is the chain
/// of targets currently being resolved on this call path, used for cycle
/// detection (§5) — never the *resolved-this-build* map, and never shared
/// with unrelated branches of the build graph.
pub fn want(
    ctx: Arc<BuildContext>,
    target: PathKey,
    caller: Option<SharedRecorder>,
    ancestors: Vec<PathKey>,
) -> BoxFuture<'static, Result<Digest, EngineError>> {
    want_inner(ctx, target, caller, ancestors, false)
}

/// Entry point for a top-level `--force` target (§10.3): bypasses both
/// memoisation and the cache probe for this one call, forcing the rule to
/// run. Never used for a recursive dependency — `force` does not propagate.
pub fn want_forced(ctx: Arc<BuildContext>, target: PathKey) -> BoxFuture<'static, Result<Digest, EngineError>> {
    want_inner(ctx, target, None, Vec::new(), true)
}

fn want_inner(
    ctx: Arc<BuildContext>,
    target: PathKey,
    caller: Option<SharedRecorder>,
    ancestors: Vec<PathKey>,
    force: bool,
) -> BoxFuture<'static, Result<Digest, EngineError>> {
    Box::pin(async move {
        if ancestors.contains(&target) {
            return Err(EngineError::Cycle(target));
        }

        if !force {
            if let Some(digest) = ctx.resolved(&target) {
                record_into_caller(&caller, &target, digest).await?;
                return Ok(digest);
            }
        }

        let digest = loop {
            match ctx.begin_or_await(&target) {
                InFlight::Owner => break resolve_and_settle(&ctx, &target, &ancestors, force).await?,
                InFlight::Waiter(notify) => {
                    notify.notified().await;
                    if let Some(digest) = ctx.resolved(&target) {
                        break digest;
                    }
                    // The previous owner failed without memoising; retry.
                    continue;
                }
            }
        };

        record_into_caller(&caller, &target, digest).await?;
        Ok(digest)
    })
}

/// Runs `resolve_target` as the sole owner of `target`'s in-flight slot,
/// always releasing the slot (and waking waiters) whether resolution
/// succeeded or failed.
async fn resolve_and_settle(
    ctx: &Arc<BuildContext>,
    target: &PathKey,
    ancestors: &[PathKey],
    force: bool,
) -> Result<Digest, EngineError> {
    let result = resolve_target(ctx, target, ancestors, force).await;
    ctx.finish_in_flight(target);
    if let Ok(digest) = result {
        ctx.memoize(target.clone(), digest);
    }
    result
}

async fn record_into_caller(
    caller: &Option<SharedRecorder>,
    target: &PathKey,
    digest: Digest,
) -> Result<(), EngineError> {
    if let Some(recorder) = caller {
        let mut recorder = recorder.lock().await;
        recorder.record_dep(SourceDep::present(target.clone(), digest))?;
    }
    Ok(())
}

#[instrument(skip(ctx, ancestors), fields(build_id = %ctx.build_id))]
async fn resolve_target(
    ctx: &Arc<BuildContext>,
    target: &PathKey,
    ancestors: &[PathKey],
    force: bool,
) -> Result<Digest, EngineError> {
    let absolute = target.resolve(ctx.repo.repo_root());

    if ctx.repo.is_source(&absolute).await? {
        debug!(target = %target, "classified as source");
        return Ok(Digest::of_path(&absolute)?);
    }

    let Some(rule_path) = ctx.rules.find_rule(target) else {
        if absolute.exists() {
            // Untracked and rule-less, but present: an ordinary file the
            // engine did not produce and has no rule to reproduce. Usable
            // as-is, same as redo treats such a file.
            return Ok(Digest::of_path(&absolute)?);
        }
        return Err(EngineError::NoRule(target.clone()));
    };

    let mut descendants = ancestors.to_vec();
    descendants.push(target.clone());

    if !force {
        if let Some(digest) = try_cache_hit(ctx, &rule_path, target, &descendants).await? {
            info!(target = %target, rule = %rule_path, "cache hit");
            return Ok(digest);
        }
    }

    run_job(ctx, rule_path, target.clone(), descendants).await
}

/// §4.1 step 4: newest-first candidate traces, each validated by recursively
/// `want`-ing every recorded dependency and comparing digests.
async fn try_cache_hit(
    ctx: &Arc<BuildContext>,
    rule_path: &PathKey,
    target: &PathKey,
    ancestors: &[PathKey],
) -> Result<Option<Digest>, EngineError> {
    let candidates = ctx.trace_store.candidates(rule_path, target)?;
    for trace in candidates {
        if validate_deps_from(ctx, &trace, 0, ancestors).await? {
            debug!(trace = %trace.trace_id().fingerprint, "trace validated");
            materialize(ctx, target, trace.output_digest)?;
            return Ok(Some(trace.output_digest));
        }
    }
    Ok(None)
}

/// Shared by the upfront cache probe (`start = 0`) and the mid-job cutoff
/// check (`start = <prefix length>`, §4.4): volatility must still be valid,
/// and every dependency from `start` onward must currently resolve (via
/// `want`, not a raw filesystem read — §4.2's "validation is recursive
/// through the coordinator") to the digest the trace recorded.
pub(crate) async fn validate_deps_from(
    ctx: &Arc<BuildContext>,
    trace: &Trace,
    start: usize,
    ancestors: &[PathKey],
) -> Result<bool, EngineError> {
    if !trace.is_within_volatility_window(ctx.now_secs()) {
        return Ok(false);
    }
    for dep in &trace.deps[start..] {
        let digest = want_inner(ctx.clone(), dep.path.clone(), None, ancestors.to_vec(), false).await?;
        if digest != dep.digest {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(crate) fn materialize(ctx: &BuildContext, target: &PathKey, digest: Digest) -> Result<(), EngineError> {
    let dest = target.resolve(ctx.repo.repo_root());
    ctx.content_store.materialize(digest, &dest)?;
    Ok(())
}

async fn run_job(
    ctx: &Arc<BuildContext>,
    rule_path: PathKey,
    target_path: PathKey,
    ancestors: Vec<PathKey>,
) -> Result<Digest, EngineError> {
    let spec = ctx.new_job_spec(rule_path, target_path.clone());
    info!(job = %spec.id, target = %target_path, rule = %spec.rule_path, "starting job");
    let verdict = crate::executor::run(ctx.clone(), spec, ancestors).await?;
    match verdict {
        Verdict::CommittedOk(trace) => Ok(trace.output_digest),
        Verdict::KilledForCacheHit(trace) => {
            materialize(ctx, &target_path, trace.output_digest)?;
            Ok(trace.output_digest)
        }
        Verdict::Failed { exit_code } => Err(EngineError::RuleFailed {
            target: target_path,
            exit_code,
        }),
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
