use super::*;
use redux_core::{Digest, PathKey};

fn dep(path: &str, content: &[u8]) -> SourceDep {
    SourceDep::present(PathKey::from_normalized(path), Digest::of_bytes(content))
}

#[test]
fn deps_grows_in_recorded_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::create(dir.path().join("job.trace")).unwrap();
    assert!(recorder.deps().is_empty());
    recorder.record_dep(dep("a.c", b"1")).unwrap();
    recorder.record_dep(dep("b.c", b"2")).unwrap();
    assert_eq!(recorder.deps(), [dep("a.c", b"1"), dep("b.c", b"2")]);
}

#[test]
fn set_volatility_only_takes_the_first_value() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::create(dir.path().join("job.trace")).unwrap();
    recorder.set_volatility(Volatility::Always).unwrap();
    recorder.set_volatility(Volatility::after(60, 0)).unwrap();
    assert_eq!(recorder.volatility(), Some(Volatility::Always));
}

#[test]
fn finalize_writes_output_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.trace");
    let recorder = Recorder::create(&path).unwrap();
    recorder.finalize(Digest::of_bytes(b"result")).unwrap();
    let parsed = redux_storage::trace_file::read_file(&path).unwrap();
    assert_eq!(parsed.output, Some(Digest::of_bytes(b"result")));
}

#[test]
fn discard_removes_the_tracefile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job.trace");
    let recorder = Recorder::create(&path).unwrap();
    recorder.discard().unwrap();
    assert!(!path.exists());
}
