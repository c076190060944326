#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census row types for hospital locations.
//!
//! A [`LocationRecord`] is the per-location occupancy snapshot produced by
//! the clinical data feed. After parsing its caret-separated location
//! string it becomes a [`ParsedLocationRecord`], which carries the derived
//! department/room/bed components alongside the untouched source record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Opaque stable identifier of a physical location.
///
/// Feeds disagree on whether this is numeric or textual, so both are
/// accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    /// Numeric identifier (e.g. `1234`).
    Int(i64),
    /// Textual identifier (e.g. `"LOC-1234"`).
    Text(String),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Whether a timestamp carried a UTC offset in the source data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampKind {
    /// Carries an explicit offset.
    Aware,
    /// No offset; interpreted as UTC when a whole department agrees.
    Naive,
}

/// A feed timestamp, keeping track of whether it was timezone-aware.
///
/// Naive values are never silently coerced on their own: callers decide
/// whether a group of timestamps is consistent before converting them
/// with [`CensusTimestamp::to_utc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CensusTimestamp {
    /// Timestamp with an explicit UTC offset.
    Aware(DateTime<FixedOffset>),
    /// Timestamp without any offset information.
    Naive(NaiveDateTime),
}

impl CensusTimestamp {
    /// Returns whether this timestamp carried an offset.
    #[must_use]
    pub const fn kind(&self) -> TimestampKind {
        match self {
            Self::Aware(_) => TimestampKind::Aware,
            Self::Naive(_) => TimestampKind::Naive,
        }
    }

    /// Converts to UTC, treating naive values as already being UTC.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Aware(dt) => dt.with_timezone(&Utc),
            Self::Naive(naive) => naive.and_utc(),
        }
    }
}

impl From<DateTime<Utc>> for CensusTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Aware(value.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for CensusTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Aware(value)
    }
}

impl From<NaiveDateTime> for CensusTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value)
    }
}

/// Error returned when a string is not a recognizable timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimestampError {
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for InvalidTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid timestamp '{}': expected ISO 8601, with or without an offset",
            self.value
        )
    }
}

impl std::error::Error for InvalidTimestampError {}

const AWARE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl FromStr for CensusTimestamp {
    type Err = InvalidTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::Aware(dt));
        }
        for format in AWARE_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
                return Ok(Self::Aware(dt));
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::Naive(naive));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::Naive(date.and_time(chrono::NaiveTime::MIN)));
        }

        Err(InvalidTimestampError {
            value: s.to_string(),
        })
    }
}

impl fmt::Display for CensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aware(dt) => f.write_str(&dt.to_rfc3339()),
            Self::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl Serialize for CensusTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CensusTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Deserializes an optional timestamp, mapping anything unusable to `None`.
///
/// Discharge timestamps are frequently missing or garbage in the feed
/// (`NaT`, empty strings, numbers). None of those may become an epoch
/// default, so they are all treated as "no discharge recorded".
fn deserialize_lenient_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<CensusTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = Option<CensusTimestamp>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional timestamp string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.parse().ok())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_option(LenientVisitor)
}

/// Bed names (lowercased) that denote logical states rather than
/// physical beds: patients waiting, patients in a procedure room, and
/// placeholder rows with no bed at all.
pub const DEFAULT_EXCLUDED_BEDS: &[&str] = &["null", "wait", "proc rm"];

/// A single location's occupancy snapshot as supplied by the data feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Stable identifier of the physical location.
    pub location_id: LocationId,
    /// Compound `DEPT^ROOM^BED` identifier.
    pub location_string: String,
    /// Display name of the owning department; the aggregation key.
    pub department: String,
    /// Whether a patient is currently assigned here.
    pub occupied: bool,
    /// Most recent discharge from this location. `None` when never
    /// recorded or unparseable.
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub last_discharge_at: Option<CensusTimestamp>,
    /// When the feed last refreshed this record.
    pub modified_at: CensusTimestamp,
}

/// The three positional components of a location string.
///
/// Missing trailing components are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedLocation {
    /// Segment 0.
    pub dept: String,
    /// Segment 1.
    pub room: String,
    /// Segment 2.
    pub bed: String,
}

/// A [`LocationRecord`] annotated with its parsed location components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLocationRecord {
    /// The unmodified source record.
    #[serde(flatten)]
    pub record: LocationRecord,
    /// Components derived from [`LocationRecord::location_string`].
    #[serde(flatten)]
    pub location: ParsedLocation,
}
