use super::*;

#[test]
fn a_single_line_depfile_lists_its_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.d");
    std::fs::write(&path, "out.o: src/a.c src/a.h\n").unwrap();
    assert_eq!(parse_depfile(&path).unwrap(), vec!["src/a.c", "src/a.h"]);
}

#[test]
fn a_backslash_continued_depfile_joins_its_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.d");
    std::fs::write(&path, "out.o: src/a.c \\\n  src/a.h \\\n  src/b.h\n").unwrap();
    assert_eq!(
        parse_depfile(&path).unwrap(),
        vec!["src/a.c", "src/a.h", "src/b.h"]
    );
}

#[test]
fn a_missing_depfile_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(parse_depfile(&dir.path().join("missing.d")).is_err());
}
