//! §10.3 "--force": bypasses both memoisation and the cache probe for the
//! named top-level target, even when nothing it depends on has changed.

use crate::prelude::*;

#[test]
fn force_reruns_the_rule_even_when_the_cache_would_hit() {
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
        "an ordinary rebuild with nothing changed should still hit the cache"
    );

    project.redux().args(&["--force", "out"]).passes();
    assert_eq!(
        project.read("run_log.txt"),
        "run\nrun\n",
        "--force should have reran the rule despite an otherwise-valid cache"
    );
    assert_eq!(project.read("out"), "hello");
}
