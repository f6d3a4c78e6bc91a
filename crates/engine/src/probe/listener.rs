//! Per-job probe server (§4.5): accepts connections on the job's private
//! socket, dispatches each request back into `want`, and watches for a
//! mid-job cutoff (§4.4) becoming provable after any dependency is
//! recorded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use redux_core::{Digest, PathKey, SourceDep, Trace, Volatility};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tracing::debug;

use crate::context::BuildContext;
use crate::coordinator;
use crate::error::EngineError;
use crate::jobserver::TokenSlot;
use crate::probe::protocol::{ProbeRequest, ProbeResponse};
use crate::probe::wire;
use crate::recorder::SharedRecorder;

/// Holds the first proven mid-job cutoff trace, if any, and wakes whoever
/// is awaiting it. Set-once: later matches (there shouldn't be any, since
/// the job is killed as soon as one is found) are ignored.
pub struct CutoffSlot {
    trace: SyncMutex<Option<Arc<Trace>>>,
    notify: Notify,
}

impl CutoffSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            trace: SyncMutex::new(None),
            notify: Notify::new(),
        })
    }

    fn set(&self, trace: Arc<Trace>) {
        let mut guard = self.trace.lock();
        if guard.is_none() {
            *guard = Some(trace);
            self.notify.notify_waiters();
        }
    }

    /// Resolves once a cutoff trace has been proven. Cancel-safe: intended
    /// to sit in a `tokio::select!` alongside the child process's exit.
    pub async fn wait(&self) -> Arc<Trace> {
        loop {
            if let Some(trace) = self.trace.lock().clone() {
                return trace;
            }
            self.notify.notified().await;
        }
    }
}

/// Runs the accept loop for one job's probe socket until cancelled (the
/// executor aborts this task once the job's process has exited or been
/// killed).
pub async fn serve(
    sock_path: PathBuf,
    ctx: Arc<BuildContext>,
    rule_path: PathKey,
    target_path: PathKey,
    recorder: SharedRecorder,
    ancestors: Vec<PathKey>,
    cutoff: Arc<CutoffSlot>,
    token_slot: TokenSlot,
) -> std::io::Result<()> {
    let _ = std::fs::remove_file(&sock_path);
    let listener = UnixListener::bind(&sock_path)?;
    // Serialises probe handling across every connection this job opens
    // (§9 "implement probe handling as synchronous per-job: one probe at a
    // time per tracefile"). Deliberately distinct from `recorder`'s own
    // lock, which only guards the data mutation itself — holding that one
    // across a recursive `want` call would deadlock against `want`'s own
    // attempt to record into the same recorder.
    let probe_lock = Arc::new(AsyncMutex::new(()));
    loop {
        let (stream, _) = listener.accept().await?;
        tokio::spawn(handle_connection(
            stream,
            ctx.clone(),
            rule_path.clone(),
            target_path.clone(),
            recorder.clone(),
            ancestors.clone(),
            probe_lock.clone(),
            cutoff.clone(),
            token_slot.clone(),
        ));
    }
}

pub fn sock_path_for(trace_path: &Path) -> PathBuf {
    trace_path.with_extension("sock")
}

async fn handle_connection(
    mut stream: UnixStream,
    ctx: Arc<BuildContext>,
    rule_path: PathKey,
    target_path: PathKey,
    recorder: SharedRecorder,
    ancestors: Vec<PathKey>,
    probe_lock: Arc<AsyncMutex<()>>,
    cutoff: Arc<CutoffSlot>,
    token_slot: TokenSlot,
) {
    loop {
        let _serialize = probe_lock.lock().await;
        let request: ProbeRequest = match wire::read_message(&mut stream).await {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(error) => {
                debug!(%error, "probe connection read error");
                return;
            }
        };
        match handle_request(
            &ctx,
            &rule_path,
            &target_path,
            &recorder,
            &ancestors,
            &cutoff,
            &token_slot,
            request,
        )
        .await
        {
            Ok(Some(response)) => {
                if wire::write_message(&mut stream, &response).await.is_err() {
                    return;
                }
            }
            // Proven cutoff: the job is about to be killed, so there's no
            // point (and no guaranteed time) to respond.
            Ok(None) => return,
            Err(error) => {
                let response = ProbeResponse::Error {
                    message: error.to_string(),
                };
                let _ = wire::write_message(&mut stream, &response).await;
            }
        }
    }
}

async fn handle_request(
    ctx: &Arc<BuildContext>,
    rule_path: &PathKey,
    target_path: &PathKey,
    recorder: &SharedRecorder,
    ancestors: &[PathKey],
    cutoff: &Arc<CutoffSlot>,
    token_slot: &TokenSlot,
    request: ProbeRequest,
) -> Result<Option<ProbeResponse>, EngineError> {
    match request {
        ProbeRequest::Want { path } => {
            let target = PathKey::from_normalized(path);
            let digest = want_releasing_token(
                ctx,
                token_slot,
                coordinator::want(ctx.clone(), target, Some(recorder.clone()), ancestors.to_vec()),
            )
            .await?;
            if let Some(trace) = check_cutoff(ctx, rule_path, target_path, recorder, ancestors).await? {
                cutoff.set(trace);
                return Ok(None);
            }
            Ok(Some(ProbeResponse::Digest {
                digest: digest.to_hex(),
            }))
        }
        ProbeRequest::Always => {
            recorder.lock().await.set_volatility(Volatility::Always)?;
            Ok(Some(ProbeResponse::Ack))
        }
        ProbeRequest::After { duration_secs } => {
            let stamped_at = ctx.now_secs();
            recorder
                .lock()
                .await
                .set_volatility(Volatility::after(duration_secs, stamped_at))?;
            Ok(Some(ProbeResponse::Ack))
        }
        ProbeRequest::Stamp { digest } => {
            let digest = Digest::from_hex(&digest)
                .map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
            {
                let mut recorder = recorder.lock().await;
                recorder.record_dep(SourceDep::present(PathKey::from_normalized("<stdin>"), digest))?;
                // §9 "Ambiguity: --stamp semantics": both hash stdin into
                // the trace and mark the trace volatile, so the next build
                // still attempts the stamp but cutoff can prove the bytes
                // are unchanged.
                recorder.set_volatility(Volatility::Always)?;
            }
            if let Some(trace) = check_cutoff(ctx, rule_path, target_path, recorder, ancestors).await? {
                cutoff.set(trace);
                return Ok(None);
            }
            Ok(Some(ProbeResponse::Ack))
        }
        ProbeRequest::Depfile { paths } => {
            for path in paths {
                let target = PathKey::from_normalized(path);
                want_releasing_token(
                    ctx,
                    token_slot,
                    coordinator::want(ctx.clone(), target, Some(recorder.clone()), ancestors.to_vec()),
                )
                .await?;
            }
            if let Some(trace) = check_cutoff(ctx, rule_path, target_path, recorder, ancestors).await? {
                cutoff.set(trace);
                return Ok(None);
            }
            Ok(Some(ProbeResponse::Ack))
        }
    }
}

/// Release this job's held jobserver token for the duration of `want_fut`
/// (a recursive `want` call the rule's probe triggered) and reacquire one
/// before returning, so the slot this job was occupying is actually free
/// for the sub-build to make progress on (§4.6).
async fn want_releasing_token<T>(
    ctx: &Arc<BuildContext>,
    token_slot: &TokenSlot,
    want_fut: impl std::future::Future<Output = Result<T, EngineError>>,
) -> Result<T, EngineError> {
    let held = token_slot.lock().await.take();
    drop(held);
    let result = want_fut.await;
    let token = ctx.jobserver.acquire().await.map_err(EngineError::Io)?;
    *token_slot.lock().await = Some(token);
    result
}

async fn check_cutoff(
    ctx: &Arc<BuildContext>,
    rule_path: &PathKey,
    target_path: &PathKey,
    recorder: &SharedRecorder,
    ancestors: &[PathKey],
) -> Result<Option<Arc<Trace>>, EngineError> {
    let prefix: Vec<SourceDep> = recorder.lock().await.deps().to_vec();
    let candidates = ctx.trace_store.traces_with_prefix(rule_path, target_path, &prefix)?;
    for trace in candidates {
        if coordinator::validate_deps_from(ctx, &trace, prefix.len(), ancestors).await? {
            return Ok(Some(trace));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
