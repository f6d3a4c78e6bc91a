//! The POSIX-make token pipe protocol (§4.6): a pipe of single-byte tokens,
//! shared with child processes via environment variables, so that `make`,
//! `cargo`, or another `redux` invoked from within a rule cooperates on the
//! same parallelism budget.
//!
//! `-jN` gives the build `N` total concurrent slots, but only `N - 1` tokens
//! ever sit in the pipe: the first `acquire()` anywhere in the build claims
//! an implicit slot that never touches the pipe at all, the same "the root
//! counts as one" convention GNU make's own jobserver uses. Any later
//! `acquire()` reads the pipe like normal. Whichever kind of token a caller
//! holds, it must release it (dropping [`JobToken`], which returns it to
//! whichever pool it came from) before suspending on a recursive sub-build,
//! and acquire a fresh one before resuming — otherwise the slot sits idle
//! under a blocked waiter and nothing else in the build can ever run.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::unistd::{pipe, read, write};
use tokio::io::unix::AsyncFd;
use tokio::sync::Mutex;

/// Borrow a raw fd for the duration of one nix syscall. Safe as long as the
/// fd outlives the call, which holds for every use below (we always borrow
/// from a live `OwnedFd` or an `AsyncFd` we still own).
#[allow(unsafe_code)]
fn borrowed(fd: RawFd) -> BorrowedFd<'static> {
    unsafe { BorrowedFd::borrow_raw(fd) }
}

/// Environment variable a root `redux` invocation publishes so that a
/// rule's child `redux` (and cooperating external tools) inherit the
/// jobserver rather than creating their own.
pub const JOBSERVER_FDS_VAR: &str = "REDUX_JOBSERVER_FDS";

struct RawFdHandle(OwnedFd);

impl AsRawFd for RawFdHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

enum TokenKind {
    /// The root's implicit slot (§4.6): returning it just flips a flag, no
    /// pipe I/O at all.
    Implicit(Arc<AtomicBool>),
    Pipe(Arc<OwnedFd>),
}

/// A held token; returns it to whichever pool it came from automatically on
/// drop so a job that fails or panics can't leak parallelism out of the
/// budget.
pub struct JobToken {
    kind: TokenKind,
}

impl Drop for JobToken {
    fn drop(&mut self) {
        match &self.kind {
            TokenKind::Implicit(free) => free.store(true, Ordering::Release),
            TokenKind::Pipe(write_fd) => {
                let _ = write(borrowed(write_fd.as_raw_fd()), b"+");
            }
        }
    }
}

/// A job's held token, released and reacquired around any recursive
/// sub-build the job's probes trigger (§4.6).
pub type TokenSlot = Arc<Mutex<Option<JobToken>>>;

pub struct Jobserver {
    read_fd: AsyncFd<RawFdHandle>,
    write_fd: Arc<OwnedFd>,
    implicit_free: Arc<AtomicBool>,
}

impl Jobserver {
    /// Create a fresh jobserver for a root invocation with `jobs` total
    /// parallelism. One slot is implicit (never touches the pipe, claimed by
    /// whichever `acquire()` gets there first) and `jobs - 1` tokens are put
    /// into the pipe (§4.6).
    pub fn create(jobs: u32) -> io::Result<Self> {
        let (read_raw, write_raw) = pipe().map_err(nix_err_to_io)?;
        set_nonblocking(read_raw.as_raw_fd())?;
        let tokens = jobs.saturating_sub(1);
        for _ in 0..tokens {
            write(borrowed(write_raw.as_raw_fd()), b"+").map_err(nix_err_to_io)?;
        }
        Ok(Self {
            read_fd: AsyncFd::new(RawFdHandle(read_raw))?,
            write_fd: Arc::new(write_raw),
            implicit_free: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Environment variable value to pass to a spawned rule's child process
    /// so it shares this jobserver (§4.3, §4.6).
    pub fn env_value(&self) -> String {
        format!(
            "{},{}",
            self.read_fd.get_ref().as_raw_fd(),
            self.write_fd.as_raw_fd()
        )
    }

    /// Block (without pinning an OS thread) until a token is available,
    /// claiming the implicit slot first if it's free. Suspension here must
    /// not hold the build context's mutex (§4.6): a worker awaiting a
    /// sub-build must release its token (drop the [`JobToken`]) before
    /// making the recursive `want` call, then `acquire` again afterward —
    /// see [`TokenSlot`].
    pub async fn acquire(&self) -> io::Result<JobToken> {
        if self
            .implicit_free
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return Ok(JobToken {
                kind: TokenKind::Implicit(self.implicit_free.clone()),
            });
        }
        loop {
            let mut guard = self.read_fd.readable().await?;
            let mut buf = [0u8; 1];
            match guard.try_io(|inner| {
                read(borrowed(inner.get_ref().as_raw_fd()), &mut buf).map_err(nix_to_io_for_try)
            }) {
                Ok(Ok(_)) => {
                    return Ok(JobToken {
                        kind: TokenKind::Pipe(self.write_fd.clone()),
                    })
                }
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
    }
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let fd = borrowed(fd);
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(nix_err_to_io)?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(nix_err_to_io)?;
    Ok(())
}

fn nix_err_to_io(e: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}

fn nix_to_io_for_try(e: nix::Error) -> io::Error {
    if e == nix::Error::EAGAIN {
        io::Error::new(io::ErrorKind::WouldBlock, e)
    } else {
        nix_err_to_io(e)
    }
}

#[cfg(test)]
#[path = "jobserver_tests.rs"]
mod tests;
