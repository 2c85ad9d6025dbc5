use crate::TagId;

/// Represents the outcome of a single id-generation attempt.
///
/// - [`IdGenStatus::Ready`] carries a freshly issued id.
/// - [`IdGenStatus::Pending`] means the sequence for the current millisecond
///   is exhausted; the caller should wait `yield_for` milliseconds for the
///   clock to advance and try again. This is the bounded intra-millisecond
///   wait, not an error.
///
/// A clock that moved backward is **not** modeled here: that case fails the
/// generation call with
/// [`Error::ClockRegression`](crate::Error::ClockRegression), because waiting
/// out a backward jump would silently risk duplicate or non-monotonic ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique id was generated and is ready to use.
    Ready {
        /// The generated id.
        id: TagId,
    },
    /// No id could be issued because the sequence is exhausted for the
    /// current tick.
    Pending {
        /// Milliseconds to wait before attempting to generate again.
        yield_for: u64,
    },
}
