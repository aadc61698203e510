//! Snowflake identifiers.
//!
//! Every remote entity is keyed by a 64-bit unsigned integer. The platform
//! sends it as a decimal string because some of its clients cannot hold a
//! full `u64` in a number; locally it is always the integer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseError, Result};

/// Platform epoch (2015-01-01T00:00:00Z) in Unix milliseconds.
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

/// A 64-bit entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Creation time encoded in the upper 42 bits.
    #[must_use]
    pub fn created_at(self) -> DateTime<Utc> {
        let millis = (self.0 >> 22) + PLATFORM_EPOCH_MS;
        DateTime::from_timestamp_millis(millis as i64).unwrap_or_default()
    }
}

/// Parse the wire form of a snowflake.
///
/// Only canonical decimal strings are accepted: no sign, no surrounding
/// whitespace and no leading zeros. That keeps [`format_snowflake`] an exact
/// inverse.
pub fn parse_snowflake(s: &str) -> Result<u64> {
    let canonical = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s.len() == 1 || !s.starts_with('0'));
    if !canonical {
        return Err(ParseError::InvalidSnowflake(s.to_owned()));
    }
    s.parse::<u64>()
        .map_err(|_| ParseError::InvalidSnowflake(s.to_owned()))
}

/// Format a snowflake for the wire.
#[must_use]
pub fn format_snowflake(value: u64) -> String {
    value.to_string()
}

impl FromStr for Snowflake {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        parse_snowflake(s).map(Self)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(value: Snowflake) -> Self {
        value.0
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

struct SnowflakeVisitor;

impl Visitor<'_> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a snowflake as a decimal string or unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Snowflake, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Snowflake, E> {
        Ok(Snowflake(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Snowflake, E> {
        u64::try_from(v)
            .map(Snowflake)
            .map_err(|_| E::custom(format!("negative snowflake: {v}")))
    }
}
