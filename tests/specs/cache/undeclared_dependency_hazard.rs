//! §5 "Undeclared dependency hazard": a dofile that reads a file without
//! probing `redux` for it first gets no protection from the cutoff
//! machinery — the trace never learns the file was read, so a later
//! change to it does not invalidate the cache. This is documented
//! behavior, not a bug: the engine can only validate what was recorded.

use crate::prelude::*;

#[test]
fn a_file_read_without_probing_it_does_not_invalidate_the_cache_on_change() {
    let project = Project::new();
    project.file("in.txt", "declared");
    project.file("extra.txt", "v1");
    project.file(
        "out.do",
        "redux in.txt\n\
         echo run >> run_log.txt\n\
         cat in.txt extra.txt > \"$3\"\n",
    );

    project.redux().args(&["out"]).passes();
    assert_eq!(project.read("out"), "declaredv1");
    assert_eq!(project.read("run_log.txt"), "run\n");

    project.file("extra.txt", "v2");
    project.redux().args(&["out"]).passes();

    assert_eq!(
        project.read("run_log.txt"),
        "run\n",
        "the undeclared dependency's change should not have forced a rebuild"
    );
    assert_eq!(
        project.read("out"),
        "declaredv1",
        "the target should still hold the stale output from before extra.txt changed"
    );
}
