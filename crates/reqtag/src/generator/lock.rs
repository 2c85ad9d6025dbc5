use std::sync::Arc;

use core::cmp::Ordering;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::mutex::Mutex;
use crate::{Error, IdGenStatus, ReqTagGenerator, Result, TagId, time::TimeSource};

/// A lock-based request-id generator for multi-threaded use.
///
/// The packed `(timestamp, machine, sequence)` state lives in an
/// [`Arc<Mutex<_>>`]; the whole read-modify-write of a generation attempt
/// happens inside one mutual-exclusion region, so concurrent callers can
/// never observe or produce the same `(timestamp, sequence)` pair. Cloning
/// the generator shares the underlying state.
///
/// ## Recommended When
/// - Fair access across threads matters
/// - You want poisoning to surface (with the default `std` mutex)
///
/// ## See Also
/// - [`AtomicReqTagGenerator`] for a lock-free variant
///
/// [`AtomicReqTagGenerator`]: crate::AtomicReqTagGenerator
pub struct LockReqTagGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<TagId>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<TagId>>,
    time: T,
}

impl<T> Clone for LockReqTagGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            time: self.time.clone(),
        }
    }
}

impl<T> LockReqTagGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for the given machine id and time source.
    ///
    /// The initial timestamp and sequence are zero; the first generation
    /// attempt rolls the state forward to the current clock reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`] if `machine_id` exceeds
    /// [`TagId::max_machine_id`]. Machine ids are assigned once per process
    /// instance and must be validated at startup, not on the hot path.
    ///
    /// # Example
    ///
    /// ```
    /// use reqtag::{LockReqTagGenerator, ReqTagGenerator, SystemClock};
    ///
    /// let generator = LockReqTagGenerator::new(3, SystemClock::default())?;
    /// let id = generator.try_next_id(|_| std::thread::yield_now())?;
    /// assert_eq!(id.machine_id(), 3);
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
    /// Useful for tests that need to start at a particular timestamp or with
    /// a partially consumed sequence.
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
        let id = TagId::try_from_components(timestamp, machine_id, sequence)?;
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(id))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(id)),
            time,
        })
    }

    /// Attempts to generate the next available id.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: a new id is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: the sequence is exhausted;
    ///   wait that many milliseconds before trying again
    /// - `Err(Error::ClockRegression { .. })`: the clock moved backward; no
    ///   id was produced and the recorded state is unchanged
    /// - `Err(Error::LockPoisoned)`: another thread panicked while holding
    ///   the state lock (default `std` mutex only)
    ///
    /// # Errors
    ///
    /// See above; regression is never converted into a wait because the
    /// caller must not be handed a potentially duplicate or decreasing id.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<IdGenStatus> {
        let now = self.time.current_millis();

        let mut id = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let last = id.timestamp();
        match now.cmp(&last) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                    Ok(IdGenStatus::Ready { id: *id })
                } else {
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                *id = id.rollover_to_timestamp(now);
                Ok(IdGenStatus::Ready { id: *id })
            }
            Ordering::Less => Err(Self::cold_clock_behind(now, last)),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now_ms: u64, last_ms: u64) -> Error {
        Error::ClockRegression { now_ms, last_ms }
    }
}

impl<T> ReqTagGenerator<T> for LockReqTagGenerator<T>
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
