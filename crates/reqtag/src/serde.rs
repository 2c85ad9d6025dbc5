//! Field adapters for serializing [`TagId`]s.
//!
//! The transport format itself belongs to the hosting service; these modules
//! are the boundary surface, usable with `#[serde(with = "...")]` on any
//! field holding a [`TagId`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialize a tag id as its native integer representation.
pub mod as_u64 {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::TagId;

    /// Serialize a tag id as a `u64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &TagId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize a tag id from a `u64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the value
    /// sets the reserved bit.
    pub fn deserialize<'de, D>(d: D) -> Result<TagId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(d)?;
        let id = TagId::from_raw(raw);
        if !id.is_valid() {
            return Err(serde::de::Error::custom(format!(
                "value {raw} sets the reserved id bit"
            )));
        }
        Ok(id)
    }
}

/// Serialize a tag id as its fixed-width base62 string form.
pub mod as_base62 {
    use super::{Deserializer, Serializer};
    use crate::TagId;

    /// Serialize a tag id as a base62 encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &TagId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(id.encode().as_str())
    }

    /// Deserialize a tag id from a base62 encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string is
    /// not a valid fixed-width base62 id.
    pub fn deserialize<'de, D>(d: D) -> Result<TagId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base62Visitor;

        impl serde::de::Visitor<'_> for Base62Visitor {
            type Value = TagId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a base62 encoded id string")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                TagId::decode(v).map_err(serde::de::Error::custom)
            }
        }

        d.deserialize_str(Base62Visitor)
    }
}
