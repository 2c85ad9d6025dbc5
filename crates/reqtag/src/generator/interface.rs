use crate::{IdGenStatus, Result, TagId, time::TimeSource};

/// A minimal interface for request-id generators.
///
/// One generator instance is shared process-wide and every caller goes
/// through it; the implementations differ only in how they serialize the
/// read-modify-write over the packed state word (mutex vs. compare-and-swap).
///
/// The hosting service typically holds the generator behind an `Arc` and
/// calls [`ReqTagGenerator::next_encoded`] once per unit of work, threading
/// the returned string through its own logging context.
pub trait ReqTagGenerator<T>: Sized
where
    T: TimeSource,
{
    /// Creates a new generator for the given machine id and time source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMachineId`](crate::Error::InvalidMachineId) if
    /// `machine_id` does not fit its bit width. This is a configuration-time
    /// failure and should abort startup.
    fn new(machine_id: u64, time: T) -> Result<Self>;

    /// Attempts to generate the next available id without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`](crate::Error::ClockRegression) if
    /// the time source reports an instant strictly before the last recorded
    /// issuance, and [`Error::LockPoisoned`](crate::Error::LockPoisoned) if a
    /// lock-based implementation observes a poisoned mutex.
    fn try_poll_id(&self) -> Result<IdGenStatus>;

    /// Generates the next available id, invoking `f(yield_for)` whenever the
    /// sequence for the current millisecond is exhausted.
    ///
    /// The wait is bounded by real clock advancement (typically sub-millisecond
    /// to a few milliseconds). Clock regression is not waited out; it
    /// propagates as an error.
    ///
    /// # Errors
    ///
    /// See [`ReqTagGenerator::try_poll_id`].
    fn try_next_id(&self, mut f: impl FnMut(u64)) -> Result<TagId> {
        loop {
            match self.try_poll_id()? {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Generates the next id and encodes it as a fixed-width base62 string.
    ///
    /// This is the once-per-request entry point for the hosting service.
    ///
    /// # Errors
    ///
    /// See [`ReqTagGenerator::try_poll_id`].
    ///
    /// # Example
    ///
    /// ```
    /// use reqtag::{LockReqTagGenerator, ReqTagGenerator, SystemClock};
    ///
    /// let generator = LockReqTagGenerator::new(1, SystemClock::default())?;
    /// let tag = generator.next_encoded()?;
    /// assert_eq!(tag.len(), reqtag::ENCODED_LEN);
    /// # Ok::<(), reqtag::Error>(())
    /// ```
    fn next_encoded(&self) -> Result<String> {
        let id = self.try_next_id(|_| std::thread::yield_now())?;
        Ok(id.encode())
    }
}
