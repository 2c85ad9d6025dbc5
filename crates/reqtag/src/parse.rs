use core::time::Duration;

use chrono::{DateTime, Local, Utc};

use crate::{Error, REQTAG_EPOCH, Result, TagId};

/// The decoded components of a previously issued tag.
///
/// Constructed only by [`parse`] / [`parse_with_epoch`] and never mutated.
/// The local timestamp is a display convenience derived from the host's
/// configured offset at read time; the UTC instant is the identity-bearing
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParsedTag {
    /// The machine id of the issuing process instance.
    pub machine_id: u64,
    /// The intra-millisecond sequence of the id.
    pub sequence: u64,
    /// The issuance instant in UTC.
    pub utc: DateTime<Utc>,
    /// The issuance instant in the host's local timezone.
    pub local: DateTime<Local>,
}

/// Decodes an encoded tag issued against the default [`REQTAG_EPOCH`].
///
/// This is the offline/diagnostic read path: it decodes the base62 string,
/// unpacks the bit fields, and reconstructs the absolute issuance instant as
/// `epoch + timestamp_offset`. It never touches generator state.
///
/// # Errors
///
/// Returns [`Error::MalformedId`] if the input has the wrong length, contains
/// a symbol outside the base62 alphabet, or decodes to a value outside the
/// valid id range.
///
/// # Example
///
/// ```
/// use reqtag::{LockReqTagGenerator, ReqTagGenerator, SystemClock, parse};
///
/// let generator = LockReqTagGenerator::new(7, SystemClock::default())?;
/// let tag = generator.next_encoded()?;
///
/// let parsed = parse(&tag)?;
/// assert_eq!(parsed.machine_id, 7);
/// # Ok::<(), reqtag::Error>(())
/// ```
pub fn parse(encoded: &str) -> Result<ParsedTag> {
    parse_with_epoch(encoded, REQTAG_EPOCH)
}

/// Decodes an encoded tag issued against a custom epoch.
///
/// The epoch must match the one the issuing clock was constructed with;
/// otherwise the reconstructed instants are shifted by the difference.
///
/// # Errors
///
/// See [`parse`]. Additionally returns [`Error::FieldOverflow`] if the
/// reconstructed instant is not representable, which cannot happen for a
/// 41-bit offset from any realistic epoch and indicates a configuration bug.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace"))]
pub fn parse_with_epoch(encoded: &str, epoch: Duration) -> Result<ParsedTag> {
    let id = TagId::decode(encoded)?;

    let unix_ms = epoch.as_millis() as u64 + id.timestamp();
    let utc = DateTime::from_timestamp_millis(unix_ms as i64).ok_or(Error::FieldOverflow {
        field: "timestamp",
        value: id.timestamp(),
        max: TagId::max_timestamp(),
    })?;

    Ok(ParsedTag {
        machine_id: id.machine_id(),
        sequence: id.sequence(),
        utc,
        local: utc.with_timezone(&Local),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Base62Error, LockReqTagGenerator, ReqTagGenerator, SystemClock};
    use chrono::TimeZone;

    #[test]
    fn reports_components_of_a_captured_instant() {
        // Issued on 2023-12-26T20:13:13.348Z by machine 1, first id of its
        // millisecond.
        let instant = Utc
            .with_ymd_and_hms(2023, 12, 26, 20, 13, 13)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(348))
            .unwrap();
        let offset_ms =
            instant.timestamp_millis() as u64 - REQTAG_EPOCH.as_millis() as u64;

        let id = TagId::try_from_components(offset_ms, 1, 0).unwrap();
        let parsed = parse(&id.encode()).unwrap();

        assert_eq!(parsed.machine_id, 1);
        assert_eq!(parsed.sequence, 0);
        assert_eq!(parsed.utc, instant);
        assert_eq!(
            parsed.utc.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            "2023-12-26T20:13:13.348"
        );
        // Local is the same instant, displayed in the host timezone.
        assert_eq!(parsed.local, parsed.utc);
    }

    #[test]
    fn parse_of_fresh_tag_matches_generation_time() {
        let generator = LockReqTagGenerator::new(9, SystemClock::default()).unwrap();

        let before_ms = Utc::now().timestamp_millis();
        let tag = generator.next_encoded().unwrap();
        let after_ms = Utc::now().timestamp_millis();

        let parsed = parse(&tag).unwrap();
        assert_eq!(parsed.machine_id, 9);

        let issued_ms = parsed.utc.timestamp_millis();
        assert!(issued_ms >= before_ms - 1, "issued {issued_ms} < {before_ms}");
        assert!(issued_ms <= after_ms + 1, "issued {issued_ms} > {after_ms}");
    }

    #[test]
    fn custom_epoch_shifts_reconstruction() {
        let id = TagId::try_from_components(1_000, 2, 3).unwrap();
        let parsed = parse_with_epoch(&id.encode(), Duration::ZERO).unwrap();

        assert_eq!(parsed.machine_id, 2);
        assert_eq!(parsed.sequence, 3);
        assert_eq!(parsed.utc.timestamp_millis(), 1_000);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            parse("0123456789"),
            Err(Error::MalformedId(Base62Error::InvalidLength { len: 10 }))
        );
    }

    #[test]
    fn rejects_foreign_symbols() {
        assert_eq!(
            parse("00000000-00"),
            Err(Error::MalformedId(Base62Error::InvalidCharacter {
                byte: b'-',
                index: 8,
            }))
        );
    }

    #[test]
    fn rejects_values_outside_the_id_range() {
        // Largest eleven-symbol string: exceeds u64 entirely.
        assert_eq!(
            parse("zzzzzzzzzzz"),
            Err(Error::MalformedId(Base62Error::Overflow))
        );
        // Fits u64 but sets the reserved bit.
        let reserved = TagId::from_raw(1 << 63).encode();
        assert_eq!(
            parse(&reserved),
            Err(Error::MalformedId(Base62Error::Overflow))
        );
    }
}
