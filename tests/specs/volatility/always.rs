//! §4.5/§8 "--always": a trace stamped volatile-always is never a cache
//! hit, regardless of how many of its declared dependencies still match.

use crate::prelude::*;

#[test]
fn always_volatile_targets_rerun_on_every_build() {
    let project = Project::new();
    project.file("in.txt", "hello");
    project.file(
        "out.do",
        "redux --always\nredux in.txt\necho run >> run_log.txt\ncat in.txt > \"$3\"\n",
    );

    project.redux().args(&["out"]).passes();
    assert_eq!(project.read("run_log.txt"), "run\n");

    project.redux().args(&["out"]).passes();
    assert_eq!(
        project.read("run_log.txt"),
        "run\nrun\n",
        "a volatile-always trace should never be a cache hit"
    );
}
