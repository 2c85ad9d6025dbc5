use core::fmt;

use crate::{Error, Result, base62};

/// A packed 64-bit request identifier.
///
/// The layout is fixed at compile time and packed from **MSB to LSB**:
///
/// ```text
///  Bit Index:  63 62            22 21         12 11          0
///              +--+---------------+-------------+-------------+
///  Field:      | r| timestamp (41)| machine (10)| sequence (12)|
///              +--+---------------+-------------+-------------+
///              |<----- MSB ------ 64 bits ------ LSB -------->|
/// ```
///
/// - `r`: reserved, always zero for a valid id
/// - `timestamp`: milliseconds since the configured epoch (~69 years of range)
/// - `machine`: id of the issuing process instance (0..=1023)
/// - `sequence`: intra-millisecond counter (0..=4095)
///
/// Because the timestamp occupies the most significant payload bits, packed
/// ids (and their fixed-width base62 encodings) sort by issuance time, with
/// the sequence breaking ties within a millisecond.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(u64);

const _: () = {
    // Compile-time check: the fields must account for every bit of the
    // backing integer.
    assert!(
        TagId::RESERVED_BITS + TagId::TIMESTAMP_BITS + TagId::MACHINE_ID_BITS
            + TagId::SEQUENCE_BITS
            == u64::BITS,
        "TagId layout must cover exactly 64 bits"
    );
};

impl TagId {
    pub const RESERVED_BITS: u32 = 1;
    pub const TIMESTAMP_BITS: u32 = 41;
    pub const MACHINE_ID_BITS: u32 = 10;
    pub const SEQUENCE_BITS: u32 = 12;

    pub const SEQUENCE_SHIFT: u32 = 0;
    pub const MACHINE_ID_SHIFT: u32 = Self::SEQUENCE_BITS;
    pub const TIMESTAMP_SHIFT: u32 = Self::SEQUENCE_BITS + Self::MACHINE_ID_BITS;

    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const MACHINE_ID_MASK: u64 = (1 << Self::MACHINE_ID_BITS) - 1;
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Packs the three components into an id.
    ///
    /// Components must already satisfy their bit widths; this is the hot-path
    /// constructor used by the generators, which maintain that invariant. Use
    /// [`TagId::try_from_components`] for caller-supplied values.
    pub(crate) const fn from_components(
        timestamp: u64,
        machine_id: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(machine_id <= Self::MACHINE_ID_MASK, "machine id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");

        Self(
            (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT
                | (machine_id & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT
                | (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT,
        )
    }

    /// Packs the three components into an id, validating each against its bit
    /// width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldOverflow`] naming the offending field when a
    /// component does not fit. The generators never produce such components;
    /// this check guards externally supplied values.
    pub fn try_from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Result<Self> {
        if timestamp > Self::TIMESTAMP_MASK {
            return Err(Error::FieldOverflow {
                field: "timestamp",
                value: timestamp,
                max: Self::TIMESTAMP_MASK,
            });
        }
        if machine_id > Self::MACHINE_ID_MASK {
            return Err(Error::FieldOverflow {
                field: "machine id",
                value: machine_id,
                max: Self::MACHINE_ID_MASK,
            });
        }
        if sequence > Self::SEQUENCE_MASK {
            return Err(Error::FieldOverflow {
                field: "sequence",
                value: sequence,
                max: Self::SEQUENCE_MASK,
            });
        }
        Ok(Self::from_components(timestamp, machine_id, sequence))
    }

    /// Extracts the timestamp offset in milliseconds since the epoch.
    pub const fn timestamp(&self) -> u64 {
        (self.0 >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the machine id.
    pub const fn machine_id(&self) -> u64 {
        (self.0 >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK
    }

    /// Extracts the intra-millisecond sequence.
    pub const fn sequence(&self) -> u64 {
        (self.0 >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum representable timestamp offset.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum representable machine id.
    pub const fn max_machine_id() -> u64 {
        Self::MACHINE_ID_MASK
    }

    /// Returns the maximum representable sequence.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Whether another id can be issued for the current millisecond.
    pub(crate) const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::SEQUENCE_MASK
    }

    /// Advances the sequence within the current millisecond.
    ///
    /// The sequence occupies the low bits, so with room available a raw
    /// increment touches only the sequence field.
    pub(crate) const fn increment_sequence(self) -> Self {
        Self(self.0 + 1)
    }

    /// Moves the id to a later millisecond, resetting the sequence to zero.
    pub(crate) const fn rollover_to_timestamp(self, now: u64) -> Self {
        Self::from_components(now, self.machine_id(), 0)
    }

    /// Returns `true` when the reserved bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.0 >> (u64::BITS - Self::RESERVED_BITS) == 0
    }

    /// Converts this id into its raw integer representation.
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// Converts a raw integer into an id without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Encodes this id as a fixed-width base62 string.
    ///
    /// The output is always [`ENCODED_LEN`](crate::ENCODED_LEN) ASCII
    /// characters and sorts lexicographically in issuance order.
    ///
    /// # Example
    ///
    /// ```
    /// use reqtag::TagId;
    ///
    /// let id = TagId::try_from_components(1, 1, 1).unwrap();
    /// let encoded = id.encode();
    /// assert_eq!(encoded.len(), reqtag::ENCODED_LEN);
    /// assert_eq!(TagId::decode(&encoded).unwrap(), id);
    /// ```
    pub fn encode(&self) -> String {
        base62::encode(self.0)
    }

    /// Decodes a base62 string back into an id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedId`] if the input has the wrong length,
    /// contains a symbol outside the base62 alphabet, or decodes to a value
    /// with the reserved bit set.
    pub fn decode(encoded: &str) -> Result<Self> {
        let raw = base62::decode(encoded)?;
        let id = Self::from_raw(raw);
        if !id.is_valid() {
            return Err(Error::MalformedId(crate::Base62Error::Overflow));
        }
        Ok(id)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagId")
            .field("raw", &format_args!("{} (0x{:016x})", self.0, self.0))
            .field("encoded", &self.encode())
            .field("timestamp", &self.timestamp())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
