use std::collections::HashSet;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use std::thread::scope;

use crate::{
    AtomicReqTagGenerator, Error, IdGenStatus, LockReqTagGenerator, ReqTagGenerator, SystemClock,
    TagId, time::TimeSource,
};

/// A settable clock shared between a test and the generator under test.
#[derive(Clone)]
struct MockClock {
    millis: Arc<AtomicU64>,
}

impl MockClock {
    fn at(millis: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(millis)),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }
}

impl TimeSource for MockClock {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }
}

trait IdGenStatusExt {
    fn unwrap_ready(self) -> TagId;
    fn unwrap_pending(self) -> u64;
}

impl IdGenStatusExt for IdGenStatus {
    fn unwrap_ready(self) -> TagId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn run_sequence_increments_within_same_tick<G>(generator: &G)
where
    G: ReqTagGenerator<MockClock>,
{
    let id1 = generator.try_poll_id().unwrap().unwrap_ready();
    let id2 = generator.try_poll_id().unwrap().unwrap_ready();
    let id3 = generator.try_poll_id().unwrap().unwrap_ready();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

fn run_pending_when_sequence_exhausted<G>(generator: &G)
where
    G: ReqTagGenerator<MockClock>,
{
    let yield_for = generator.try_poll_id().unwrap().unwrap_pending();
    assert_eq!(yield_for, 1);
}

/// Consumes the full sequence space within one simulated millisecond, then
/// checks the generator waits for the clock instead of producing a duplicate
/// triple.
fn run_exhaustion_blocks_until_clock_advances<G>(generator: &G, clock: &MockClock)
where
    G: ReqTagGenerator<MockClock>,
{
    for i in 0..=TagId::max_sequence() {
        let id = generator
            .try_next_id(|_| panic!("unexpected wait before exhaustion"))
            .unwrap();
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.sequence(), i);
    }

    let mut waits = 0;
    let id = generator
        .try_next_id(|yield_for| {
            assert_eq!(yield_for, 1);
            waits += 1;
            clock.set(43);
        })
        .unwrap();

    assert_eq!(waits, 1);
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

fn run_regression_fails_without_issuing<G>(generator: &G, clock: &MockClock)
where
    G: ReqTagGenerator<MockClock>,
{
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.timestamp(), 42);

    clock.set(41);
    assert_eq!(
        generator.try_poll_id(),
        Err(Error::ClockRegression {
            now_ms: 41,
            last_ms: 42,
        })
    );
    // try_next_id must propagate rather than wait the regression out.
    assert_eq!(
        generator.try_next_id(|_| panic!("regression must not be waited out")),
        Err(Error::ClockRegression {
            now_ms: 41,
            last_ms: 42,
        })
    );

    // Once the clock catches up, the same generator resumes where it left
    // off: same tick, next sequence.
    clock.set(42);
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.timestamp(), 42);
    assert_eq!(id.sequence(), 1);
}

fn run_monotonic<G>(generator: &G)
where
    G: ReqTagGenerator<SystemClock>,
{
    const TOTAL_IDS: usize = 10_000;

    let mut last = TagId::from_raw(0);
    for _ in 0..TOTAL_IDS {
        let id = generator
            .try_next_id(|_| core::hint::spin_loop())
            .unwrap();
        assert!(id.timestamp() >= last.timestamp());
        assert!(id > last, "ids must strictly increase: {last} then {id}");
        assert_eq!(id.machine_id(), 1);
        last = id;
    }
}

fn run_threaded_uniqueness<G>(generator: &G)
where
    G: ReqTagGenerator<SystemClock> + Sync,
{
    const THREADS: usize = 8;
    const TOTAL_IDS: usize = 4096 * 32;
    const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

    let seen_ids = Mutex::new(HashSet::with_capacity(TOTAL_IDS));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..IDS_PER_THREAD {
                    let id = generator
                        .try_next_id(|_| std::thread::yield_now())
                        .unwrap();
                    assert!(seen_ids.lock().unwrap().insert(id));
                }
            });
        }
    });

    let final_count = seen_ids.lock().unwrap().len();
    assert_eq!(final_count, TOTAL_IDS, "expected {TOTAL_IDS} unique ids");
}

#[test]
fn lock_generator_sequence_test() {
    let generator = LockReqTagGenerator::new(0, MockClock::at(42)).unwrap();
    run_sequence_increments_within_same_tick(&generator);
}

#[test]
fn atomic_generator_sequence_test() {
    let generator = AtomicReqTagGenerator::new(0, MockClock::at(42)).unwrap();
    run_sequence_increments_within_same_tick(&generator);
}

#[test]
fn lock_generator_pending_test() {
    let generator =
        LockReqTagGenerator::from_components(0, 0, TagId::max_sequence(), MockClock::at(0))
            .unwrap();
    run_pending_when_sequence_exhausted(&generator);
}

#[test]
fn atomic_generator_pending_test() {
    let generator =
        AtomicReqTagGenerator::from_components(0, 0, TagId::max_sequence(), MockClock::at(0))
            .unwrap();
    run_pending_when_sequence_exhausted(&generator);
}

#[test]
fn lock_generator_exhaustion_test() {
    let clock = MockClock::at(42);
    let generator = LockReqTagGenerator::new(1, clock.clone()).unwrap();
    run_exhaustion_blocks_until_clock_advances(&generator, &clock);
}

#[test]
fn atomic_generator_exhaustion_test() {
    let clock = MockClock::at(42);
    let generator = AtomicReqTagGenerator::new(1, clock.clone()).unwrap();
    run_exhaustion_blocks_until_clock_advances(&generator, &clock);
}

#[test]
fn lock_generator_regression_test() {
    let clock = MockClock::at(42);
    let generator = LockReqTagGenerator::new(1, clock.clone()).unwrap();
    run_regression_fails_without_issuing(&generator, &clock);
}

#[test]
fn atomic_generator_regression_test() {
    let clock = MockClock::at(42);
    let generator = AtomicReqTagGenerator::new(1, clock.clone()).unwrap();
    run_regression_fails_without_issuing(&generator, &clock);
}

#[test]
fn lock_generator_monotonic_test() {
    let generator = LockReqTagGenerator::new(1, SystemClock::default()).unwrap();
    run_monotonic(&generator);
}

#[test]
fn atomic_generator_monotonic_test() {
    let generator = AtomicReqTagGenerator::new(1, SystemClock::default()).unwrap();
    run_monotonic(&generator);
}

#[test]
fn lock_generator_threaded_uniqueness_test() {
    let generator = LockReqTagGenerator::new(0, SystemClock::default()).unwrap();
    run_threaded_uniqueness(&generator);
}

#[test]
fn atomic_generator_threaded_uniqueness_test() {
    let generator = AtomicReqTagGenerator::new(0, SystemClock::default()).unwrap();
    run_threaded_uniqueness(&generator);
}

#[test]
fn machine_id_validated_at_construction() {
    let out_of_range = TagId::max_machine_id() + 1;
    assert_eq!(
        LockReqTagGenerator::new(out_of_range, MockClock::at(0)).err(),
        Some(Error::InvalidMachineId {
            machine_id: out_of_range,
        })
    );
    assert_eq!(
        AtomicReqTagGenerator::new(out_of_range, MockClock::at(0)).err(),
        Some(Error::InvalidMachineId {
            machine_id: out_of_range,
        })
    );
}

#[test]
fn next_encoded_produces_fixed_width_tags() {
    let generator = LockReqTagGenerator::new(5, SystemClock::default()).unwrap();
    let tag = generator.next_encoded().unwrap();
    assert_eq!(tag.len(), crate::ENCODED_LEN);
    assert!(tag.bytes().all(|b| b.is_ascii_alphanumeric()));

    let id = TagId::decode(&tag).unwrap();
    assert_eq!(id.machine_id(), 5);
}
