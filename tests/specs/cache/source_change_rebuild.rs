//! §4.1 "miss" on a declared dependency: when a recorded dependency's
//! content digest no longer matches, the newest trace fails validation and
//! the rule runs again.

use crate::prelude::*;

#[test]
fn changing_a_declared_dependency_triggers_a_rebuild() {
    let project = Project::new();
    project.file("in.txt", "v1");
    project.file(
        "out.do",
        "redux in.txt\necho run >> run_log.txt\ncat in.txt > \"$3\"\n",
    );

    project.redux().args(&["out"]).passes();
    assert_eq!(project.read("out"), "v1");
    assert_eq!(project.read("run_log.txt"), "run\n");

    project.file("in.txt", "v2");
    project.redux().args(&["out"]).passes();

    assert_eq!(project.read("out"), "v2");
    assert_eq!(
        project.read("run_log.txt"),
        "run\nrun\n",
        "the rule should have rerun once for the changed dependency"
    );
}
