//! §4.1 "hit": every recorded dependency in the newest trace still matches,
//! so the rule does not run again.

use crate::prelude::*;

#[test]
fn an_untouched_rebuild_does_not_rerun_the_rule() {
    let project = Project::new();
    project.file("in.txt", "hello");
    project.file(
        "out.do",
        "redux in.txt\necho run >> run_log.txt\ncat in.txt > \"$3\"\n",
    );

    project.redux().args(&["out"]).passes();
    assert_eq!(project.read("run_log.txt"), "run\n");

    project.redux().args(&["out"]).passes();
    assert_eq!(
        project.read("run_log.txt"),
        "run\n",
        "cache hit should not have rerun the rule"
    );
    assert_eq!(project.read("out"), "hello");
}
