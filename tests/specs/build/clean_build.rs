//! §4.1 "miss": a target with no recorded trace runs its dofile and
//! commits the result.

use crate::prelude::*;

#[test]
fn a_target_with_no_dofile_and_no_rule_is_an_untracked_source_file() {
    let project = Project::new();
    project.file("in.txt", "hello");
    project.redux().args(&["in.txt"]).passes();
}

#[test]
fn a_clean_build_runs_the_dofile_and_produces_the_target() {
    let project = Project::new();
    project.file("in.txt", "hello");
    project.file("out.do", "redux in.txt\ncat in.txt > \"$3\"\n");

    project.redux().args(&["out"]).passes();

    assert_eq!(project.read("out"), "hello");
}

#[test]
fn default_dofiles_are_tried_outward_from_the_target_directory() {
    let project = Project::new();
    project.file("src/in.txt", "payload");
    // The probe's dependency path is always repo-root-relative (§4.5), not
    // relative to the dofile's own directory, even though the dofile's own
    // shell commands run with that directory as their cwd.
    project.file("src/default.out.do", "redux src/in.txt\ncat in.txt > \"$3\"\n");

    project.redux().args(&["src/a.out"]).passes();

    assert_eq!(project.read("src/a.out"), "payload");
}

#[test]
fn a_failing_dofile_leaves_no_target_and_propagates_its_exit_code() {
    let project = Project::new();
    project.file("out.do", "exit 7\n");

    let run = project.redux().args(&["out"]).fails();
    assert_eq!(run.code(), Some(7));
    assert!(!project.exists("out"));
}
