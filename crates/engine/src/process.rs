//! A child process running in its own process group, with the ability to
//! terminate that whole group in one shot (§4.4, §5 "Killing child
//! processes cleanly", §9).
//!
//! Grandchildren of a killed rule (anything it spawned) die with it, since
//! they inherit the rule's process group rather than redux's.

use std::io;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::{getpgid, Pid};
use tokio::process::{Child, Command};

/// Allow this one `pre_exec` call: it is the only way to put a freshly
/// spawned child into its own process group before `exec`, which is what
/// makes killing the whole group safe later. Nothing else in this crate
/// touches `unsafe`.
#[allow(unsafe_code)]
fn into_own_process_group(command: &mut Command) {
    // Safety: `setsid` is async-signal-safe and the closure does nothing
    // else between fork and exec.
    unsafe {
        command.pre_exec(|| {
            nix::unistd::setsid()
                .map(|_pgid| ())
                .map_err(nix_err_to_io)
        });
    }
}

fn nix_err_to_io(e: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}

/// A spawned rule process, killable as a group (§4.3, §4.4).
pub struct ManagedChild {
    child: Child,
}

impl ManagedChild {
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        command.kill_on_drop(true);
        into_own_process_group(&mut command);
        let child = command.spawn()?;
        Ok(Self { child })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn pgid(&self) -> io::Result<Pid> {
        let pid = self.id().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "child has no pid (already reaped)")
        })?;
        getpgid(Some(Pid::from_raw(pid as i32))).map_err(nix_err_to_io)
    }

    fn signal_group(&self, sig: Signal) -> io::Result<()> {
        let pgid = self.pgid()?;
        signal::kill(Pid::from_raw(-pgid.as_raw()), sig).map_err(nix_err_to_io)
    }

    /// Wait for the child to exit normally (the "rule completed" path).
    pub async fn wait(&mut self) -> io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }

    /// Mid-job cutoff / SIGINT handling (§4.4, §7): send a terminate
    /// signal to the whole process group, give it `grace` to exit, then
    /// SIGKILL the group if it hasn't.
    pub async fn terminate_then_kill(&mut self, grace: Duration) -> io::Result<()> {
        self.signal_group(Signal::SIGTERM)?;
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(_) => Ok(()),
            Err(_elapsed) => {
                tracing::warn!("rule process group did not exit after SIGTERM, sending SIGKILL");
                self.signal_group(Signal::SIGKILL)?;
                self.child.wait().await.map(|_| ())
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
