use core::cmp;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Error, IdGenStatus, ReqTagGenerator, Result, TagId, time::TimeSource};

/// A lock-free request-id generator for multi-threaded use.
///
/// The packed `(timestamp, machine, sequence)` state lives in a single
/// [`AtomicU64`]; each generation attempt computes the successor state and
/// publishes it with one compare-and-swap. A lost race is reported as a
/// zero-length wait and retried by the caller, so two threads can never
/// commit the same `(timestamp, sequence)` pair.
///
/// ## Recommended When
/// - Throughput matters more than fairness under contention
///
/// ## See Also
/// - [`LockReqTagGenerator`] for the mutex-based variant
///
/// [`LockReqTagGenerator`]: crate::LockReqTagGenerator
pub struct AtomicReqTagGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    time: T,
}

impl<T> AtomicReqTagGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given machine id and time source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] if `machine_id` exceeds
    /// [`TagId::max_machine_id`].
    ///
    /// # Example
    ///
    /// ```
    /// use reqtag::{AtomicReqTagGenerator, ReqTagGenerator, SystemClock};
    ///
    /// let generator = AtomicReqTagGenerator::new(0, SystemClock::default())?;
    /// let tag = generator.next_encoded()?;
    /// assert_eq!(tag.len(), reqtag::ENCODED_LEN);
    /// # Ok::<(), reqtag::Error>(())
    /// ```
    pub fn new(machine_id: u64, time: T) -> Result<Self> {
        if machine_id > TagId::max_machine_id() {
            return Err(Error::InvalidMachineId { machine_id });
        }
        Self::from_components(0, machine_id, 0, time)
    }

    /// Creates a generator preloaded with explicit component values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] if any component exceeds its bit
    /// width.
    pub fn from_components(
        timestamp: u64,
        machine_id: u64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        let initial = TagId::try_from_components(timestamp, machine_id, sequence)?;
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial.to_raw())),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial.to_raw()),
            time,
        })
    }

    /// Attempts to generate the next available id.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: a new id is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: the sequence is exhausted
    ///   (wait that many milliseconds), or the compare-and-swap lost a race
    ///   (`yield_for` of zero; retry immediately)
    /// - `Err(Error::ClockRegression { .. })`: the clock moved backward; no
    ///   id was produced and the published state is unchanged
    ///
    /// # Errors
    ///
    /// See above.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let now = self.time.current_millis();

        let current_raw = self.state.load(Ordering::Relaxed);
        let current = TagId::from_raw(current_raw);
        let last = current.timestamp();

        let next = match now.cmp(&last) {
            cmp::Ordering::Equal => {
                if current.has_sequence_room() {
                    current.increment_sequence()
                } else {
                    return Ok(IdGenStatus::Pending { yield_for: 1 });
                }
            }
            cmp::Ordering::Greater => current.rollover_to_timestamp(now),
            cmp::Ordering::Less => return Err(Self::cold_clock_behind(now, last)),
        };

        if self
            .state
            .compare_exchange(
                current_raw,
                next.to_raw(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(IdGenStatus::Ready { id: next })
        } else {
            // CAS failed - another thread won the race. Yield 0 to retry
            // immediately.
            Ok(IdGenStatus::Pending { yield_for: 0 })
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now_ms: u64, last_ms: u64) -> Error {
        Error::ClockRegression { now_ms, last_ms }
    }
}

impl<T> ReqTagGenerator<T> for AtomicReqTagGenerator<T>
where
    T: TimeSource,
{
    fn new(machine_id: u64, time: T) -> Result<Self> {
        Self::new(machine_id, time)
    }

    fn try_poll_id(&self) -> Result<IdGenStatus> {
        self.try_poll_id()
    }
}
