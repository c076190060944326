//! Removal of virtual, non-bed locations before aggregation.

use std::collections::BTreeSet;

use ward_census_location_models::{DEFAULT_EXCLUDED_BEDS, ParsedLocationRecord};

/// Case-insensitive set of bed names that are not physical beds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedExclusions {
    names: BTreeSet<String>,
}

impl BedExclusions {
    /// Builds an exclusion set. Names are lowercased; whitespace is kept
    /// exactly as given.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Returns `true` if `bed` names a virtual location.
    #[must_use]
    pub fn is_excluded(&self, bed: &str) -> bool {
        self.names.contains(&bed.to_lowercase())
    }
}

impl Default for BedExclusions {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_BEDS)
    }
}

/// Drops records whose bed is excluded, keeping the rest in order.
#[must_use]
pub fn filter_beds(
    records: Vec<ParsedLocationRecord>,
    exclusions: &BedExclusions,
) -> Vec<ParsedLocationRecord> {
    let before = records.len();
    let kept: Vec<ParsedLocationRecord> = records
        .into_iter()
        .filter(|r| !exclusions.is_excluded(&r.location.bed))
        .collect();

    if kept.len() < before {
        log::debug!(
            "Excluded {} non-bed location(s), {} remain",
            before - kept.len(),
            kept.len()
        );
    }

    kept
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use ward_census_location_models::{LocationId, LocationRecord};

    use super::*;
    use crate::parse_locations;

    fn records(locations: &[&str]) -> Vec<ParsedLocationRecord> {
        let raw = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| LocationRecord {
                location_id: LocationId::Int(i64::try_from(i).unwrap()),
                location_string: (*loc).to_string(),
                department: "T03".to_string(),
                occupied: false,
                last_discharge_at: None,
                modified_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap().into(),
            })
            .collect();
        parse_locations(raw)
    }

    fn beds(records: &[ParsedLocationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.location.bed.as_str()).collect()
    }

    #[test]
    fn default_set_is_case_insensitive() {
        let exclusions = BedExclusions::default();
        for bed in ["null", "NULL", "Wait", "WAIT", "proc rm", "Proc Rm", "PROC RM"] {
            assert!(exclusions.is_excluded(bed), "{bed}");
        }
        assert!(!exclusions.is_excluded("BY02-18"));
    }

    #[test]
    fn internal_whitespace_is_significant() {
        let exclusions = BedExclusions::default();
        assert!(!exclusions.is_excluded("Proc  Rm"));
        assert!(!exclusions.is_excluded(" wait"));
    }

    #[test]
    fn drops_virtual_locations_and_keeps_order() {
        let input = records(&[
            "T03^BY01^BY01-01",
            "T03^WAIT^WAIT",
            "T03^BY02^BY02-18",
            "T03^PR^Proc Rm",
            "T03^X^null",
            "T03^BY03^BY03-02",
        ]);
        let kept = filter_beds(input, &BedExclusions::default());
        assert_eq!(beds(&kept), vec!["BY01-01", "BY02-18", "BY03-02"]);
    }

    #[test]
    fn empty_bed_is_kept_by_default() {
        let kept = filter_beds(records(&["T03^LOUNGE"]), &BedExclusions::default());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let input = records(&["A^1^A-1", "A^W^wait", "A^2^A-2", "A^P^proc rm"]);
        let exclusions = BedExclusions::default();
        let once = filter_beds(input, &exclusions);
        let twice = filter_beds(once.clone(), &exclusions);
        assert_eq!(once, twice);
    }

    #[test]
    fn custom_exclusions_replace_defaults() {
        let exclusions = BedExclusions::new(["Chair"]);
        let kept = filter_beds(records(&["A^1^CHAIR", "A^2^wait"]), &exclusions);
        assert_eq!(beds(&kept), vec!["wait"]);
    }
}
