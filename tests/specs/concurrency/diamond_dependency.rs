//! §4.1/§8: two top-level targets sharing a dependency, built in one
//! invocation, build that dependency exactly once — memoisation and
//! in-flight coalescing within a single `BuildContext`, not just the
//! on-disk cache.

use crate::prelude::*;

#[test]
fn a_shared_dependency_is_built_once_for_two_concurrent_top_level_targets() {
    let project = Project::new();
    project.file("base.txt", "X");
    project.file(
        "shared.do",
        "echo run >> shared_run.txt\ncat base.txt > \"$3\"\n",
    );
    project.file("a.do", "redux shared\ncat shared > \"$3\"\nprintf A >> \"$3\"\n");
    project.file("b.do", "redux shared\ncat shared > \"$3\"\nprintf B >> \"$3\"\n");

    project.redux().args(&["-j", "2", "a", "b"]).passes();

    assert_eq!(project.read("a"), "XA");
    assert_eq!(project.read("b"), "XB");
    assert_eq!(
        project.read("shared_run.txt"),
        "run\n",
        "the shared dependency should have run exactly once"
    );
}
