//! redux - a redo-lineage build tool with constructive traces.

mod build;
mod depfile;
mod duration;
mod logging;
mod probe;

use std::path::PathBuf;

use clap::Parser;
use redux_engine::config::{BUILD_ID_VAR, PROBE_SOCK_VAR};

#[derive(Parser)]
#[command(
    name = "redux",
    version,
    about = "A redo-lineage build tool with constructive traces"
)]
pub struct Cli {
    /// Targets to build (root invocation) or declare as dependencies
    /// (probe invocation, run as the child of a running rule)
    targets: Vec<String>,

    /// Parallel job cap (root invocation only)
    #[arg(short = 'j', value_name = "N")]
    jobs: Option<u32>,

    /// Treat the cache as empty for the named targets, forcing a rebuild
    /// (root invocation only)
    #[arg(long)]
    force: bool,

    /// Mark the current rule's trace volatile-always (probe invocation only)
    #[arg(long)]
    always: bool,

    /// Mark the current rule's trace volatile-after DURATION, e.g. `10m`
    /// (probe invocation only)
    #[arg(long, value_name = "DURATION")]
    after: Option<String>,

    /// Hash stdin into the current rule's trace and mark it volatile-always
    /// (probe invocation only, §9 "Ambiguity: --stamp semantics")
    #[arg(long)]
    stamp: bool,

    /// Expand a make-style depfile's dependencies into the current rule's
    /// trace (probe invocation only)
    #[arg(long, value_name = "PATH")]
    depfile: Option<PathBuf>,

    /// Report which dofile would build each target (not yet wired)
    #[arg(long)]
    whichdo: bool,
    /// List each target's recorded source dependencies (not yet wired)
    #[arg(long)]
    sources: bool,
    /// List each target's recorded outputs (not yet wired)
    #[arg(long)]
    outputs: bool,
    /// Explain why each target was (or wasn't) rebuilt (not yet wired)
    #[arg(long)]
    howdid: bool,
    /// Remove targets and their recorded traces (not yet wired)
    #[arg(long)]
    clean: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let probe_context = std::env::var(BUILD_ID_VAR)
        .ok()
        .zip(std::env::var(PROBE_SOCK_VAR).ok());

    let result = match probe_context {
        Some((_build_id, sock_path)) => probe::run(&cli, &PathBuf::from(sock_path))
            .await
            .map(|()| 0),
        None => build::run(&cli).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("redux: {e:#}");
            std::process::exit(1);
        }
    }
}
