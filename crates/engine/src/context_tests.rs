use super::*;
use redux_adapters::FakeAdapter;
use redux_core::{Digest, PathKey, SequentialIdGen};
use redux_storage::{ContentStore, TraceStore};
use std::time::Duration;

fn test_context() -> BuildContext {
    let dir = tempfile::tempdir().unwrap();
    let adapter = Arc::new(FakeAdapter::new(dir.path()));
    BuildContext::with_id_gen_and_clock(
        BuildId::new("b1"),
        adapter.clone(),
        adapter,
        Arc::new(ContentStore::open(dir.path().join("blobs")).unwrap()),
        Arc::new(TraceStore::open(dir.path().join("traces")).unwrap()),
        Arc::new(Jobserver::create(1).unwrap()),
        EngineConfig {
            redux_dir: dir.path().join("redux"),
            jobs: 1,
            replay_budget: Duration::from_millis(200),
        },
        SequentialIdGen::new("job"),
        redux_core::FakeClock::at(1_000),
    )
}

#[test]
fn unresolved_target_returns_none() {
    let ctx = test_context();
    assert_eq!(ctx.resolved(&PathKey::from_normalized("a")), None);
}

#[test]
fn memoize_then_resolved_round_trips() {
    let ctx = test_context();
    let target = PathKey::from_normalized("a");
    ctx.memoize(target.clone(), Digest::of_bytes(b"hi"));
    assert_eq!(ctx.resolved(&target), Some(Digest::of_bytes(b"hi")));
}

#[test]
fn memoize_is_first_write_wins() {
    let ctx = test_context();
    let target = PathKey::from_normalized("a");
    ctx.memoize(target.clone(), Digest::of_bytes(b"first"));
    ctx.memoize(target.clone(), Digest::of_bytes(b"second"));
    assert_eq!(ctx.resolved(&target), Some(Digest::of_bytes(b"first")));
}

#[test]
fn first_claim_on_a_target_is_owner_second_is_waiter() {
    let ctx = test_context();
    let target = PathKey::from_normalized("a");
    assert!(matches!(ctx.begin_or_await(&target), InFlight::Owner));
    assert!(matches!(ctx.begin_or_await(&target), InFlight::Waiter(_)));
}

#[test]
fn finish_in_flight_lets_target_be_claimed_again() {
    let ctx = test_context();
    let target = PathKey::from_normalized("a");
    assert!(matches!(ctx.begin_or_await(&target), InFlight::Owner));
    ctx.finish_in_flight(&target);
    assert!(matches!(ctx.begin_or_await(&target), InFlight::Owner));
}

#[test]
fn job_ids_are_distinct() {
    let ctx = test_context();
    let a = ctx.new_job_id();
    let b = ctx.new_job_id();
    assert_ne!(a, b);
}

#[test]
fn now_secs_uses_the_injected_clock() {
    let ctx = test_context();
    assert_eq!(ctx.now_secs(), 1_000);
}
