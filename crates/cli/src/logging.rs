//! Logging setup (§10.1): a `tracing-subscriber` `fmt` layer honoring
//! `EnvFilter` from `$REDUX_LOG`, falling back to `$RUST_LOG`, with `-v`/`-q`
//! CLI flags layered over the env default. Writes straight to stderr rather
//! than a rotating log file — there is no daemon state directory here to
//! rotate into.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = std::env::var("REDUX_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
