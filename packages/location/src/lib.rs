#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location string parsing and non-bed filtering for census rows.
//!
//! The clinical feed identifies every location with a compound
//! `DEPT^ROOM^BED` string. [`parser`] splits it into components and
//! [`filter`] drops the virtual locations (waiting areas, procedure rooms,
//! placeholders) that must not count as bed capacity.

pub mod filter;
pub mod parser;

pub use filter::{BedExclusions, filter_beds};
pub use parser::{parse_location, parse_location_strict, parse_locations};

/// Errors from strict location parsing.
///
/// The default parser is permissive and never produces these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The location string did not split into exactly three segments.
    #[error("Location '{location}' has {found} segment(s), expected 3")]
    SegmentCount {
        /// The offending location string.
        location: String,
        /// Number of caret-separated segments found.
        found: usize,
    },

    /// One of the three segments was empty.
    #[error("Location '{location}' has an empty {component} segment")]
    EmptySegment {
        /// The offending location string.
        location: String,
        /// Which component was empty (`dept`, `room` or `bed`).
        component: &'static str,
    },
}
