//! Probe mode (§4.5): this invocation is running as the child of some
//! rule's process, so `REDUX_BUILD_ID` and `REDUX_PROBE_SOCK` are already
//! set in its environment. Every flag just sends one framed request over
//! the job's private Unix socket and waits for the ack.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use redux_core::Digest;
use redux_engine::probe::protocol::{ProbeRequest, ProbeResponse};
use redux_engine::probe::wire;
use tokio::net::UnixStream;

use crate::depfile::parse_depfile;
use crate::duration::parse_duration_secs;
use crate::Cli;

pub async fn run(cli: &Cli, sock_path: &Path) -> Result<()> {
    let mut stream = UnixStream::connect(sock_path)
        .await
        .with_context(|| format!("connecting to probe socket {}", sock_path.display()))?;

    if cli.always {
        send(&mut stream, ProbeRequest::Always).await?;
    }
    if let Some(after) = &cli.after {
        let duration_secs = parse_duration_secs(after)?;
        send(&mut stream, ProbeRequest::After { duration_secs }).await?;
    }
    if cli.stamp {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("reading stdin for --stamp")?;
        let digest = Digest::of_bytes(&bytes).to_hex();
        send(&mut stream, ProbeRequest::Stamp { digest }).await?;
    }
    if let Some(depfile) = &cli.depfile {
        let paths = parse_depfile(depfile)?;
        send(&mut stream, ProbeRequest::Depfile { paths }).await?;
    }
    for target in &cli.targets {
        send(&mut stream, ProbeRequest::Want { path: target.clone() }).await?;
    }
    Ok(())
}

/// Sends one request and waits for its response. `Ok(None)` from the wire
/// means the job's probe listener closed the connection without answering —
/// the normal shape of a mid-job cutoff kill (§4.4), where the job (and
/// therefore this process, its descendant) is about to be terminated anyway.
async fn send(stream: &mut UnixStream, request: ProbeRequest) -> Result<()> {
    wire::write_message(stream, &request).await?;
    match wire::read_message::<ProbeResponse, _>(stream).await? {
        Some(ProbeResponse::Error { message }) => bail!(message),
        Some(_) | None => Ok(()),
    }
}
