use crate::{Base62Error, TagId};

/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All possible errors that `reqtag` can produce.
///
/// Generation errors ([`Error::ClockRegression`], [`Error::LockPoisoned`]) are
/// surfaced synchronously to the caller and are recoverable by retrying.
/// Configuration errors ([`Error::InvalidMachineId`]) are raised once at
/// generator construction and should abort startup. Parse errors
/// ([`Error::MalformedId`]) are caused by caller-supplied input and never
/// affect the generation path. [`Error::FieldOverflow`] is a defensive check
/// that indicates a logic or configuration bug if it ever surfaces.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured machine id does not fit the machine-id bit width.
    #[error(
        "machine id {machine_id} exceeds the {bits}-bit limit ({max})",
        bits = TagId::MACHINE_ID_BITS,
        max = TagId::MACHINE_ID_MASK
    )]
    InvalidMachineId { machine_id: u64 },

    /// The clock source reported an instant strictly before the last recorded
    /// issuance.
    ///
    /// Handing out an id here could duplicate a (timestamp, sequence) pair, so
    /// the call fails instead. The caller may retry once the clock catches up;
    /// the generator itself is unharmed.
    #[error("clock moved backward: now {now_ms} ms precedes last issuance at {last_ms} ms")]
    ClockRegression { now_ms: u64, last_ms: u64 },

    /// A component value does not fit its bit field.
    #[error("{field} value {value} exceeds field maximum {max}")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// The encoded string violates the codec or layout contract.
    #[error("malformed id: {0}")]
    MalformedId(#[from] Base62Error),

    /// The generator mutex was poisoned by a panicking thread.
    ///
    /// Only reachable with the default `std` mutex; the `parking-lot` feature
    /// has no poisoning.
    #[error("generator lock poisoned by a panicking thread")]
    LockPoisoned,
}

use std::sync::{MutexGuard, PoisonError};

// Convert all poisoned lock errors to a simplified `LockPoisoned`
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
