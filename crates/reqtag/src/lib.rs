//! Compact, sortable, unique request identifiers.
//!
//! Each id packs an issuance timestamp, the issuing machine's id, and an
//! intra-millisecond sequence into a single `u64`, externally represented as
//! a fixed-width base62 string that sorts in issuance order. One generator
//! instance is shared process-wide; [`parse`] reconstructs the original
//! components from a previously issued tag for offline diagnostics.
//!
//! ```
//! use reqtag::{LockReqTagGenerator, ReqTagGenerator, SystemClock, parse};
//!
//! let generator = LockReqTagGenerator::new(1, SystemClock::default())?;
//!
//! // Once per unit of work:
//! let tag = generator.next_encoded()?;
//!
//! // Offline, from a log line:
//! let parsed = parse(&tag)?;
//! assert_eq!(parsed.machine_id, 1);
//! # Ok::<(), reqtag::Error>(())
//! ```
//!
//! Generation fails with [`Error::ClockRegression`] when the clock source
//! reports a time before the last issuance; the sequence space for a
//! millisecond is bounded, and exhausting it waits for the next tick rather
//! than producing a colliding id.

mod base62;
mod error;
mod generator;
mod id;
mod parse;
#[cfg(feature = "serde")]
mod serde;
mod status;
mod time;

pub use crate::base62::{Base62Error, ENCODED_LEN};
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::parse::*;
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::status::*;
pub use crate::time::*;
