//! Test helpers for behavioral specifications.
//!
//! High-level DSL for driving the `redux` binary against a throwaway
//! project directory, modeled on the teacher's `tests/specs/prelude.rs`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Returns the path to the `redux` binary, preferring the llvm-cov target
/// directory (matches the teacher's coverage-aware resolution) before
/// falling back to a standard debug build.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn redux_binary() -> PathBuf {
    binary_path("redux")
}

/// Directory containing the `redux` binary, prepended to `PATH` so a
/// dofile can declare dependencies by invoking `redux <path>` as a bare
/// command (§4.5's probe contract assumes `redux` is reachable this way,
/// same as `redo-ifchange` is expected to be on `PATH` in a redo dofile).
fn redux_bin_dir() -> PathBuf {
    redux_binary()
        .parent()
        .expect("redux binary should have a parent directory")
        .to_path_buf()
}

pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        let path = std::env::var("PATH").unwrap_or_default();
        let path = format!("{}:{path}", redux_bin_dir().display());
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![("PATH".into(), path)],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(redux_binary());
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        // Every probe's own invocation of `redux` inherits REDUX_BUILD_ID /
        // REDUX_PROBE_SOCK from its parent job; a stray copy from the test
        // harness's own environment would misroute a root invocation into
        // probe mode.
        cmd.env_remove("REDUX_BUILD_ID");
        cmd.env_remove("REDUX_PROBE_SOCK");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{expected}'\nstderr: {stderr}"
        );
        self
    }
}

/// A throwaway git repository used as a `redux` project: every test gets
/// its own checkout and its own `$REDUX_DIR`, mirroring the teacher's
/// per-test `OJ_STATE_DIR` isolation.
pub struct Project {
    dir: tempfile::TempDir,
    redux_dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
            redux_dir: tempfile::tempdir().unwrap(),
        };
        project.git_init();
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn git_init(&self) {
        Command::new("git")
            .args(["init", "-q"])
            .current_dir(self.path())
            .status()
            .expect("git init should work");
        Command::new("git")
            .args(["config", "user.email", "redux@example.com"])
            .current_dir(self.path())
            .status()
            .expect("git config should work");
        Command::new("git")
            .args(["config", "user.name", "redux"])
            .current_dir(self.path())
            .status()
            .expect("git config should work");
    }

    /// Write a file at the given path (parent directories created
    /// automatically). Files need not be `git add`ed: an untracked but
    /// present file with no rule is still a usable leaf (§4.1).
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    pub fn make_executable(&self, path: impl AsRef<Path>) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let full_path = self.dir.path().join(path.as_ref());
            let mut perms = std::fs::metadata(&full_path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&full_path, perms).unwrap();
        }
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.dir.path().join(path.as_ref())).unwrap()
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.dir.path().join(path.as_ref()).exists()
    }

    /// Run `redux` in this project, with its own isolated `$REDUX_DIR`.
    pub fn redux(&self) -> CliBuilder {
        cli()
            .pwd(self.path())
            .env("REDUX_DIR", self.redux_dir.path().to_string_lossy())
    }
}
