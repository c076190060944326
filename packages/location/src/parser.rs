//! Caret-separated location string parsing.
//!
//! Splitting is positional: segment 0 is the department, segment 1 the
//! room and segment 2 the bed. Non-bed locations routinely carry fewer
//! than three segments, so the permissive parser fills missing trailing
//! components with empty strings instead of failing.

use ward_census_location_models::{LocationRecord, ParsedLocation, ParsedLocationRecord};

use crate::ParseError;

/// Separator between location components.
pub const SEGMENT_SEPARATOR: char = '^';

const COMPONENTS: [&str; 3] = ["dept", "room", "bed"];

/// Splits a location string into its department, room and bed.
///
/// Never fails. Absent segments become empty strings and segments past
/// the third are ignored.
#[must_use]
pub fn parse_location(location_string: &str) -> ParsedLocation {
    let mut segments = location_string.split(SEGMENT_SEPARATOR);
    let mut next = || segments.next().unwrap_or_default().to_string();

    ParsedLocation {
        dept: next(),
        room: next(),
        bed: next(),
    }
}

/// Annotates each record with its parsed location, preserving order.
#[must_use]
pub fn parse_locations(records: Vec<LocationRecord>) -> Vec<ParsedLocationRecord> {
    records
        .into_iter()
        .map(|record| {
            let location = parse_location(&record.location_string);
            ParsedLocationRecord { record, location }
        })
        .collect()
}

/// Splits a location string, requiring exactly three non-empty segments.
///
/// # Errors
///
/// Returns [`ParseError`] if the string does not have exactly three
/// segments or any segment is empty.
pub fn parse_location_strict(location_string: &str) -> Result<ParsedLocation, ParseError> {
    let segments: Vec<&str> = location_string.split(SEGMENT_SEPARATOR).collect();

    if segments.len() != COMPONENTS.len() {
        return Err(ParseError::SegmentCount {
            location: location_string.to_string(),
            found: segments.len(),
        });
    }

    if let Some((component, _)) = COMPONENTS
        .iter()
        .zip(&segments)
        .find(|(_, segment)| segment.is_empty())
    {
        return Err(ParseError::EmptySegment {
            location: location_string.to_string(),
            component: *component,
        });
    }

    Ok(parse_location(location_string))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use ward_census_location_models::LocationId;

    use super::*;

    fn record(location_string: &str) -> LocationRecord {
        LocationRecord {
            location_id: LocationId::Int(1),
            location_string: location_string.to_string(),
            department: "T03".to_string(),
            occupied: false,
            last_discharge_at: None,
            modified_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap().into(),
        }
    }

    #[test]
    fn splits_three_part_location() {
        let parsed = parse_location("T03^BY02^BY02-18");
        assert_eq!(parsed.dept, "T03");
        assert_eq!(parsed.room, "BY02");
        assert_eq!(parsed.bed, "BY02-18");
    }

    #[test]
    fn missing_segments_are_empty() {
        let parsed = parse_location("T03^WAIT");
        assert_eq!(parsed.dept, "T03");
        assert_eq!(parsed.room, "WAIT");
        assert_eq!(parsed.bed, "");

        let parsed = parse_location("");
        assert_eq!(parsed, ParsedLocation::default());
    }

    #[test]
    fn extra_segments_are_ignored() {
        let parsed = parse_location("A^B^C^D");
        assert_eq!(parsed.bed, "C");
    }

    #[test]
    fn does_not_trim_or_validate() {
        let parsed = parse_location(" T03 ^^Proc Rm");
        assert_eq!(parsed.dept, " T03 ");
        assert_eq!(parsed.room, "");
        assert_eq!(parsed.bed, "Proc Rm");
    }

    #[test]
    fn annotates_records_in_order() {
        let parsed = parse_locations(vec![record("A^1^A-1"), record("B^2")]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].location.bed, "A-1");
        assert_eq!(parsed[0].record.location_string, "A^1^A-1");
        assert_eq!(parsed[1].location.dept, "B");
        assert_eq!(parsed[1].location.bed, "");
    }

    #[test]
    fn strict_accepts_well_formed() {
        let parsed = parse_location_strict("T03^BY02^BY02-18").unwrap();
        assert_eq!(parsed, parse_location("T03^BY02^BY02-18"));
    }

    #[test]
    fn strict_rejects_wrong_segment_count() {
        assert_eq!(
            parse_location_strict("T03^WAIT"),
            Err(ParseError::SegmentCount {
                location: "T03^WAIT".to_string(),
                found: 2,
            })
        );
        assert!(parse_location_strict("A^B^C^D").is_err());
    }

    #[test]
    fn strict_rejects_empty_segment() {
        assert_eq!(
            parse_location_strict("T03^^BY02-18"),
            Err(ParseError::EmptySegment {
                location: "T03^^BY02-18".to_string(),
                component: "room",
            })
        );
    }
}
