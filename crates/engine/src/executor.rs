//! Job executor (§4.3): spawns the rule process under the temp-file
//! protocol, races it against a possible mid-job cutoff (§4.4), and settles
//! the job's verdict — committing a trace and output on success, unlinking
//! everything on failure or cutoff.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tracing::info;

use crate::config::{BUILD_ID_VAR, PROBE_SOCK_VAR};
use crate::context::BuildContext;
use crate::error::EngineError;
use crate::job::{JobSpec, Verdict};
use crate::jobserver::{TokenSlot, JOBSERVER_FDS_VAR};
use crate::probe::listener::{self, CutoffSlot};
use crate::process::ManagedChild;
use crate::recorder::{Recorder, SharedRecorder};
use redux_core::PathKey;

/// How long a killed rule process group gets to exit on its own after
/// `SIGTERM` before the executor escalates to `SIGKILL` (§4.4, §5, §9).
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

pub async fn run(
    ctx: Arc<BuildContext>,
    spec: JobSpec,
    ancestors: Vec<PathKey>,
) -> Result<Verdict, EngineError> {
    let started = std::time::Instant::now();
    let token = ctx.jobserver.acquire().await.map_err(EngineError::Io)?;
    let token_slot: TokenSlot = Arc::new(tokio::sync::Mutex::new(Some(token)));

    let repo_root = ctx.repo.repo_root().to_path_buf();
    let target_abs = spec.target_path.resolve(&repo_root);
    let rule_abs = spec.rule_path.resolve(&repo_root);
    let tmp_path = sibling_path(&target_abs, "tmp");
    let trace_path = sibling_path(&target_abs, "trace");
    let sock_path = listener::sock_path_for(&trace_path);

    let recorder: SharedRecorder = Arc::new(tokio::sync::Mutex::new(Recorder::create(&trace_path)?));
    let cutoff = CutoffSlot::new();

    let listener_task = tokio::spawn(listener::serve(
        sock_path.clone(),
        ctx.clone(),
        spec.rule_path.clone(),
        spec.target_path.clone(),
        recorder.clone(),
        ancestors,
        cutoff.clone(),
        token_slot.clone(),
    ));

    let basename = basename_for(&spec.target_path, &spec.rule_path);
    let mut command = build_command(&rule_abs, &basename, &spec.target_path, &tmp_path);
    command.env(BUILD_ID_VAR, ctx.build_id.as_str());
    command.env(PROBE_SOCK_VAR, &sock_path);
    command.env(JOBSERVER_FDS_VAR, ctx.jobserver.env_value());

    let mut child = match ManagedChild::spawn(command) {
        Ok(child) => child,
        Err(e) => {
            listener_task.abort();
            let _ = std::fs::remove_file(&sock_path);
            return Err(EngineError::Io(e));
        }
    };

    enum Outcome {
        Exited(std::io::Result<std::process::ExitStatus>),
        CutoffProven(Arc<redux_core::Trace>),
    }

    let outcome = tokio::select! {
        status = child.wait() => Outcome::Exited(status),
        trace = cutoff.wait() => Outcome::CutoffProven(trace),
    };

    listener_task.abort();
    let _ = std::fs::remove_file(&sock_path);
    // Release this job's token now rather than waiting on `token_slot`'s
    // refcount: any still-running probe connection handlers (§9, not
    // cancelled by the abort above) hold their own clone of `token_slot` and
    // could otherwise keep the token pinned past this job's own lifetime.
    token_slot.lock().await.take();

    let verdict = match outcome {
        Outcome::Exited(status) => {
            settle_exit(&ctx, &spec, status.map_err(EngineError::Io)?, recorder, &tmp_path, &trace_path).await?
        }
        Outcome::CutoffProven(trace) => {
            child
                .terminate_then_kill(TERMINATE_GRACE)
                .await
                .map_err(EngineError::Io)?;
            let _ = std::fs::remove_file(&tmp_path);
            take_recorder(recorder).await?.discard()?;
            info!(job = %spec.id, target = %spec.target_path, "killed for mid-job cutoff");
            Verdict::KilledForCacheHit((*trace).clone())
        }
    };

    info!(job = %spec.id, target = %spec.target_path, elapsed = ?started.elapsed(), "job finished");
    Ok(verdict)
}

async fn settle_exit(
    ctx: &Arc<BuildContext>,
    spec: &JobSpec,
    status: std::process::ExitStatus,
    recorder: SharedRecorder,
    tmp_path: &Path,
    trace_path: &Path,
) -> Result<Verdict, EngineError> {
    if !status.success() {
        let _ = std::fs::remove_file(tmp_path);
        take_recorder(recorder).await?.discard()?;
        return Ok(Verdict::Failed {
            exit_code: status.code().unwrap_or(1),
        });
    }

    let digest = ctx.content_store.insert_from_file(tmp_path)?;
    let target_abs = spec.target_path.resolve(ctx.repo.repo_root());
    if let Some(parent) = target_abs.parent() {
        std::fs::create_dir_all(parent).map_err(EngineError::Io)?;
    }
    std::fs::rename(tmp_path, &target_abs).map_err(EngineError::Io)?;

    let recorder = take_recorder(recorder).await?;
    recorder.finalize(digest)?;
    let trace = ctx
        .trace_store
        .commit_tracefile(&spec.rule_path, &spec.target_path, trace_path)?;
    Ok(Verdict::CommittedOk(trace))
}

/// Wait for the probe listener's spawned connection handlers to drop their
/// clone of `recorder` so it can be unwrapped and consumed (`finalize`/
/// `discard` take `self`). The listener task itself is already aborted by
/// the time this is called; any surviving clones belong to in-flight
/// connection handlers that are in the middle of noticing their socket
/// closed, which happens promptly once the job's process (and therefore
/// every fd it held) is gone.
async fn take_recorder(recorder: SharedRecorder) -> Result<Recorder, EngineError> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    let mut recorder = recorder;
    loop {
        match Arc::try_unwrap(recorder) {
            Ok(mutex) => return Ok(mutex.into_inner()),
            Err(arc) => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(EngineError::CorruptTrace(
                        "probe connections for this job did not release the recorder in time".into(),
                    ));
                }
                recorder = arc;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }
}

fn sibling_path(target_abs: &Path, suffix: &str) -> PathBuf {
    let dir = target_abs.parent().unwrap_or_else(|| Path::new("."));
    let name = target_abs
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("target");
    dir.join(format!(".{name}.{suffix}"))
}

/// The `basename` positional argument (§6 "rule invocation contract"): for
/// a `default.<ext>.do` match, the target name with that extension peeled;
/// for an exact-name dofile, the target's own filename unchanged.
fn basename_for(target: &PathKey, rule_path: &PathKey) -> String {
    let target_name = target.as_str().rsplit('/').next().unwrap_or(target.as_str());
    let rule_name = rule_path
        .as_str()
        .rsplit('/')
        .next()
        .unwrap_or(rule_path.as_str());
    match rule_name
        .strip_prefix("default.")
        .and_then(|s| s.strip_suffix(".do"))
    {
        Some(ext) => target_name
            .strip_suffix(&format!(".{ext}"))
            .unwrap_or(target_name)
            .to_string(),
        None => target_name.to_string(),
    }
}

fn build_command(rule_abs: &Path, basename: &str, target: &PathKey, tmp_path: &Path) -> Command {
    let mut command = if is_executable(rule_abs) {
        Command::new(rule_abs)
    } else {
        let mut command = Command::new("sh");
        command.arg("-e").arg(rule_abs);
        command
    };
    if let Some(parent) = rule_abs.parent() {
        command.current_dir(parent);
    }
    command.arg(basename).arg(target.as_str()).arg(tmp_path);
    command
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
