//! §6 CLI grammar: argument errors a root invocation should reject before
//! ever touching a build context.

use crate::prelude::*;

#[test]
fn no_targets_is_an_error() {
    let project = Project::new();
    project.redux().args(&[]).fails();
}

#[test]
fn reporting_flags_are_rejected_as_not_yet_wired() {
    let project = Project::new();
    project.file("out.do", "#!/bin/sh\nprintf x > \"$3\"\n");
    project
        .redux()
        .args(&["--whichdo", "out"])
        .fails()
        .stderr_has("not yet wired");
}

#[test]
fn an_unreadable_target_with_no_rule_fails_with_a_useful_message() {
    let project = Project::new();
    project
        .redux()
        .args(&["missing-target"])
        .fails()
        .stderr_has("missing-target");
}
