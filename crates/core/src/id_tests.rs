use super::*;

define_id! {
    pub struct TestId;
}

#[test]
fn short_truncates_long_ids() {
    let id = TestId::new("0123456789abcdef");
    assert_eq!(id.short(8), "01234567");
}

#[test]
fn short_leaves_short_ids_alone() {
    let id = TestId::new("abc");
    assert_eq!(id.short(8), "abc");
}

#[test]
fn display_matches_inner_string() {
    let id = TestId::new("target-a");
    assert_eq!(id.to_string(), "target-a");
}

#[test]
fn sequential_id_gen_is_monotonic_and_distinct() {
    let gen = SequentialIdGen::new("build");
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a, "build-1");
    assert_eq!(b, "build-2");
}

#[test]
fn uuid_id_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}
