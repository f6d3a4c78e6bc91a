//! Behavioral specifications for the `redux` CLI.
//!
//! Black-box: each test invokes the `redux` binary against a throwaway git
//! project and checks exit codes, file contents and side-effect counters.
//! See tests/specs/prelude.rs for the project/CLI builder DSL.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli/errors.rs"]
mod cli_errors;

#[path = "specs/build/clean_build.rs"]
mod build_clean_build;

#[path = "specs/cache/untouched_rebuild.rs"]
mod cache_untouched_rebuild;
#[path = "specs/cache/source_change_rebuild.rs"]
mod cache_source_change_rebuild;
#[path = "specs/cache/force_rebuild.rs"]
mod cache_force_rebuild;
#[path = "specs/cache/undeclared_dependency_hazard.rs"]
mod cache_undeclared_dependency_hazard;

#[path = "specs/concurrency/diamond_dependency.rs"]
mod concurrency_diamond_dependency;

#[path = "specs/volatility/always.rs"]
mod volatility_always;
