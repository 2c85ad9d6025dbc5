use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch: Sunday, January 1, 2023 00:00:00 UTC
///
/// All timestamps are offset-encoded against this instant; 41 bits of
/// milliseconds give roughly 69 years of range from it.
pub const REQTAG_EPOCH: Duration = Duration::from_millis(1_672_531_200_000);

/// A trait for time sources that return the current instant at millisecond
/// granularity.
///
/// The unit is **milliseconds since the configured epoch**. The sequencer
/// compares consecutive readings to detect a clock that moved backward, so
/// implementations should report what they observe rather than smooth over
/// regressions.
///
/// This abstraction exists so tests can drive forward jumps, backward jumps,
/// and millisecond boundaries deterministically instead of depending on
/// wall-clock timing.
///
/// # Example
///
/// ```
/// use reqtag::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

/// A wall-clock time source offset from a configurable epoch.
///
/// Every call reads [`SystemTime::now`], so host clock adjustments (NTP
/// corrections, manual changes, virtualization pauses) are visible to the
/// sequencer, which reports them as
/// [`Error::ClockRegression`](crate::Error::ClockRegression) instead of
/// issuing a potentially duplicate id.
#[derive(Clone, Debug)]
pub struct SystemClock {
    epoch_ms: u64,
}

impl Default for SystemClock {
    /// Constructs a clock aligned to the default [`REQTAG_EPOCH`].
    ///
    /// Panics if the system time is earlier than that epoch.
    fn default() -> Self {
        Self::with_epoch(REQTAG_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a wall clock using a custom epoch as the origin (t = 0),
    /// specified as a [`Duration`] since 1970-01-01 UTC.
    ///
    /// The epoch defines the zero-point for every timestamp this clock will
    /// report and therefore for every id encoded from it. It must not lie in
    /// the future: a timestamp before the epoch would make the offset
    /// negative and corrupt the bit layout.
    ///
    /// # Panics
    ///
    /// Panics if the current system time is earlier than the given epoch.
    ///
    /// # Example
    ///
    /// ```
    /// use reqtag::{REQTAG_EPOCH, SystemClock, TimeSource};
    ///
    /// let clock = SystemClock::with_epoch(REQTAG_EPOCH);
    /// assert!(clock.current_millis() > 0);
    /// ```
    pub fn with_epoch(epoch: Duration) -> Self {
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH");
        system_now
            .checked_sub(epoch)
            .expect("system clock before configured epoch");

        Self {
            epoch_ms: epoch.as_millis() as u64,
        }
    }
}

impl TimeSource for SystemClock {
    /// Returns the number of milliseconds since the configured epoch.
    ///
    /// A wall clock that has fallen behind the epoch saturates to zero; the
    /// sequencer then reports the jump as a regression.
    fn current_millis(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        (now.as_millis() as u64).saturating_sub(self.epoch_ms)
    }
}
