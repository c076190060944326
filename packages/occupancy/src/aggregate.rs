//! Per-department aggregation of filtered census rows.
//!
//! Rows are grouped by their exact `department` value. Each group yields
//! bed/patient counts, the latest refresh time, the day count since the
//! latest discharge, and the closure verdict from [`crate::closure`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ward_census_location_models::{CensusTimestamp, ParsedLocationRecord, TimestampKind};
use ward_census_occupancy_models::{ClosureThresholds, DepartmentSummary, NO_DISCHARGE_SENTINEL};

use crate::closure::classify;
use crate::{CensusError, DataIntegrityReason};

/// Groups records by department and summarizes each group.
///
/// Summaries are returned in department-name order.
///
/// # Errors
///
/// Returns [`CensusError::DataIntegrity`] if any department mixes
/// timezone-aware and naive timestamps.
pub fn aggregate_departments(
    records: &[ParsedLocationRecord],
    thresholds: &ClosureThresholds,
) -> Result<Vec<DepartmentSummary>, CensusError> {
    let mut groups: BTreeMap<&str, Vec<&ParsedLocationRecord>> = BTreeMap::new();
    for row in records {
        groups
            .entry(row.record.department.as_str())
            .or_default()
            .push(row);
    }

    log::debug!(
        "Aggregating {} location row(s) into {} department(s)",
        records.len(),
        groups.len()
    );

    groups
        .into_iter()
        .map(|(department, rows)| summarize_department(department, &rows, thresholds))
        .collect()
}

/// Summarizes one department's rows.
///
/// # Errors
///
/// Returns [`CensusError::DataIntegrity`] if `rows` is empty (there is no
/// `modified_at` to anchor the day count) or mixes aware and naive
/// timestamps.
pub fn summarize_department(
    department: &str,
    rows: &[&ParsedLocationRecord],
    thresholds: &ClosureThresholds,
) -> Result<DepartmentSummary, CensusError> {
    let kind = timestamp_kind(department, rows)?;

    let modified_at = rows
        .iter()
        .map(|row| row.record.modified_at.to_utc())
        .max()
        .ok_or_else(|| CensusError::DataIntegrity {
            department: department.to_string(),
            reason: DataIntegrityReason::EmptyGroup,
        })?;

    let last_discharge = rows
        .iter()
        .filter_map(|row| row.record.last_discharge_at.as_ref())
        .map(CensusTimestamp::to_utc)
        .max();

    #[allow(clippy::cast_possible_wrap)]
    let beds = rows.len() as i64;
    #[allow(clippy::cast_possible_wrap)]
    let patients = rows.iter().filter(|row| row.record.occupied).count() as i64;
    let empties = beds - patients;

    let days_since_last_discharge =
        last_discharge.map_or(NO_DISCHARGE_SENTINEL, |discharge| {
            whole_days_between(discharge, modified_at)
        });

    let verdict = classify(days_since_last_discharge, patients, thresholds);

    log::debug!(
        "{department}: beds={beds} patients={patients} days={days_since_last_discharge} -> {verdict}"
    );
    if empties < 0 {
        log::warn!("{department}: {patients} patient(s) in {beds} bed(s), empties={empties}");
    }

    Ok(DepartmentSummary {
        department: department.to_string(),
        beds,
        patients,
        empties,
        days_since_last_discharge,
        closed_temp: verdict.closed_temp(),
        closed_perm: verdict.closed_perm(),
        modified_at: restore_kind(modified_at, kind),
    })
}

/// Whole days from `earlier` to `later`, truncating any partial day.
///
/// Negative when `earlier` is actually after `later`.
#[must_use]
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_days()
}

/// Determines the single timestamp kind shared by all of a department's
/// timestamps, or fails if aware and naive values are mixed.
fn timestamp_kind(
    department: &str,
    rows: &[&ParsedLocationRecord],
) -> Result<Option<TimestampKind>, CensusError> {
    let mut kinds = rows.iter().flat_map(|row| {
        std::iter::once(row.record.modified_at.kind())
            .chain(row.record.last_discharge_at.as_ref().map(CensusTimestamp::kind))
    });

    let Some(first) = kinds.next() else {
        return Ok(None);
    };

    if kinds.any(|kind| kind != first) {
        return Err(CensusError::DataIntegrity {
            department: department.to_string(),
            reason: DataIntegrityReason::MixedTimezones,
        });
    }

    Ok(Some(first))
}

/// Reports the aggregated time in the same flavor as the input: naive
/// departments stay naive, aware ones are reported in UTC.
fn restore_kind(utc: DateTime<Utc>, kind: Option<TimestampKind>) -> CensusTimestamp {
    match kind {
        Some(TimestampKind::Naive) => CensusTimestamp::Naive(utc.naive_utc()),
        Some(TimestampKind::Aware) | None => CensusTimestamp::from(utc),
    }
}
