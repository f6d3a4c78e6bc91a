use super::*;
use redux_core::Digest;

fn dep(path: &str, content: &[u8]) -> SourceDep {
    SourceDep::present(PathKey::from_normalized(path), Digest::of_bytes(content))
}

fn trace(rule: &str, target: &str, deps: Vec<SourceDep>, output: &[u8]) -> Trace {
    Trace {
        rule_path: PathKey::from_normalized(rule),
        target_path: PathKey::from_normalized(target),
        deps,
        volatility: None,
        output_digest: Digest::of_bytes(output),
    }
}

#[test]
fn insert_then_candidates_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path()).unwrap();
    let t = trace("build.do", "out.o", vec![dep("a.c", b"1")], b"result");
    store.insert(t.clone()).unwrap();

    let candidates = store
        .candidates(&PathKey::from_normalized("build.do"), &PathKey::from_normalized("out.o"))
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(*candidates[0], t);
}

#[test]
fn candidates_empty_for_unknown_target() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path()).unwrap();
    let candidates = store
        .candidates(&PathKey::from_normalized("build.do"), &PathKey::from_normalized("missing.o"))
        .unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn traces_with_prefix_finds_exact_and_longer_matches() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path()).unwrap();
    let rule = PathKey::from_normalized("build.do");
    let target = PathKey::from_normalized("out.o");

    let short = trace("build.do", "out.o", vec![dep("a.c", b"1")], b"short-result");
    let long = trace(
        "build.do",
        "out.o",
        vec![dep("a.c", b"1"), dep("b.h", b"2")],
        b"long-result",
    );
    store.insert(short.clone()).unwrap();
    store.insert(long.clone()).unwrap();

    let prefix = vec![dep("a.c", b"1")];
    let mut matches = store.traces_with_prefix(&rule, &target, &prefix).unwrap();
    matches.sort_by_key(|t| t.deps.len());
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].deps.len(), 1);
    assert_eq!(matches[1].deps.len(), 2);
}

#[test]
fn traces_with_prefix_excludes_divergent_traces() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path()).unwrap();
    let rule = PathKey::from_normalized("build.do");
    let target = PathKey::from_normalized("out.o");

    let diverged = trace("build.do", "out.o", vec![dep("a.c", b"DIFFERENT")], b"result");
    store.insert(diverged).unwrap();

    let prefix = vec![dep("a.c", b"1")];
    let matches = store.traces_with_prefix(&rule, &target, &prefix).unwrap();
    assert!(matches.is_empty());
}

#[test]
fn traces_with_prefix_matches_empty_prefix_against_every_trace() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path()).unwrap();
    let rule = PathKey::from_normalized("build.do");
    let target = PathKey::from_normalized("out.o");

    store
        .insert(trace("build.do", "out.o", vec![dep("a.c", b"1")], b"result"))
        .unwrap();

    let matches = store.traces_with_prefix(&rule, &target, &[]).unwrap();
    assert_eq!(matches.len(), 1);
}

#[test]
fn reopening_the_store_reloads_committed_traces_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let t = trace("build.do", "out.o", vec![dep("a.c", b"1")], b"result");
    {
        let store = TraceStore::open(dir.path()).unwrap();
        store.insert(t.clone()).unwrap();
    }
    let store = TraceStore::open(dir.path()).unwrap();
    let candidates = store
        .candidates(&PathKey::from_normalized("build.do"), &PathKey::from_normalized("out.o"))
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(*candidates[0], t);
}

#[test]
fn commit_tracefile_moves_file_into_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path().join("traces")).unwrap();
    let tmp = dir.path().join("job.trace");
    let mut writer = trace_file::TraceFileWriter::create(&tmp).unwrap();
    writer.append_dep(&dep("a.c", b"1")).unwrap();
    writer.finalize(Digest::of_bytes(b"result")).unwrap();

    let rule = PathKey::from_normalized("build.do");
    let target = PathKey::from_normalized("out.o");
    let committed = store.commit_tracefile(&rule, &target, &tmp).unwrap();
    assert!(!tmp.exists());
    assert_eq!(committed.deps[0], dep("a.c", b"1"));

    let candidates = store.candidates(&rule, &target).unwrap();
    assert_eq!(candidates.len(), 1);
}

#[test]
fn distinct_targets_do_not_share_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let store = TraceStore::open(dir.path()).unwrap();
    store
        .insert(trace("build.do", "a.o", vec![dep("a.c", b"1")], b"a-result"))
        .unwrap();
    store
        .insert(trace("build.do", "b.o", vec![dep("b.c", b"2")], b"b-result"))
        .unwrap();

    let a = store
        .candidates(&PathKey::from_normalized("build.do"), &PathKey::from_normalized("a.o"))
        .unwrap();
    let b = store
        .candidates(&PathKey::from_normalized("build.do"), &PathKey::from_normalized("b.o"))
        .unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert_ne!(a[0].output_digest, b[0].output_digest);
}
