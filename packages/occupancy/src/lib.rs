#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Department census aggregation, closure inference and bed registry
//! reconciliation.
//!
//! [`build_census`] is the single entry point. It is a pure function of a
//! location snapshot, the registry's closed-bed overrides, and a
//! [`CensusConfig`]:
//!
//! 1. parse each `DEPT^ROOM^BED` location string,
//! 2. drop virtual non-bed locations,
//! 3. aggregate per department and classify closures ([`aggregate`],
//!    [`closure`]),
//! 4. left-join the registry overrides ([`reconcile`]),
//! 5. optionally drop permanently closed departments and sum the rest.
//!
//! Data-quality problems that should not abort a dashboard refresh
//! (negative empties, duplicate or unmatched overrides) are returned as
//! [`Anomaly`] values. Only structurally unusable departments fail the
//! whole computation.

pub mod aggregate;
pub mod closure;
pub mod config;
pub mod reconcile;

use strum_macros::{AsRefStr, Display};
use thiserror::Error;
use ward_census_location::{BedExclusions, filter_beds, parse_locations};
use ward_census_location_models::LocationRecord;
use ward_census_occupancy_models::{
    Anomaly, CensusConfig, CensusReport, CensusTotals, ClosedBedOverride,
    ReconciledDepartmentView,
};

pub use aggregate::aggregate_departments;
pub use closure::classify;
pub use config::{default_config, parse_config_toml};
pub use reconcile::{Reconciliation, reconcile};

/// Why a department's timestamps could not be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DataIntegrityReason {
    /// The department had no rows, so there is no `modified_at`.
    EmptyGroup,
    /// Timezone-aware and naive timestamps were mixed.
    MixedTimezones,
}

/// Errors that can occur while building a census.
#[derive(Debug, Error)]
pub enum CensusError {
    /// A department's timestamps cannot be aggregated.
    #[error("Data integrity error in department '{department}': {reason}")]
    DataIntegrity {
        /// Department whose rows were unusable.
        department: String,
        /// What was wrong with them.
        reason: DataIntegrityReason,
    },

    /// A registry override carried a negative closed-bed count.
    #[error("Invalid override for department '{department}': closed count {closed_count} is negative")]
    InvalidOverride {
        /// Department named by the override row.
        department: String,
        /// The rejected count.
        closed_count: i64,
    },

    /// A bed count exceeded the range of `i64`.
    #[error("Count overflow while computing {field} for '{department}'")]
    CountOverflow {
        /// Department (or override department) being summed.
        department: String,
        /// Which count overflowed.
        field: &'static str,
    },

    /// Configuration TOML could not be parsed.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but is not usable.
    #[error("Invalid config: {message}")]
    InvalidConfig {
        /// Description of what went wrong.
        message: String,
    },
}

/// Builds the per-department census from one complete snapshot.
///
/// # Errors
///
/// Returns [`CensusError::DataIntegrity`] if any department mixes aware
/// and naive timestamps, [`CensusError::InvalidOverride`] for a negative
/// override count, and [`CensusError::CountOverflow`] if a count does not
/// fit in `i64`. No partial report is produced.
pub fn build_census(
    records: Vec<LocationRecord>,
    overrides: &[ClosedBedOverride],
    config: &CensusConfig,
) -> Result<CensusReport, CensusError> {
    let total_rows = records.len();
    let exclusions = BedExclusions::new(&config.excluded_beds);
    let beds = filter_beds(parse_locations(records), &exclusions);

    log::info!(
        "Building census from {} of {total_rows} location row(s) and {} override(s)",
        beds.len(),
        overrides.len()
    );

    let summaries = aggregate_departments(&beds, &config.thresholds)?;
    let Reconciliation {
        mut views,
        anomalies,
    } = reconcile(summaries, overrides)?;

    if !config.include_permanently_closed {
        let before = views.len();
        views.retain(|view| !view.closed_perm);
        log::debug!(
            "Dropped {} permanently closed department(s)",
            before - views.len()
        );
    }

    let totals = summarize_totals(&views)?;

    Ok(CensusReport {
        departments: views,
        totals,
        anomalies,
    })
}

/// Sums department views into hospital-wide totals.
///
/// # Errors
///
/// Returns [`CensusError::CountOverflow`] if any sum leaves the `i64`
/// range.
pub fn summarize_totals(views: &[ReconciledDepartmentView]) -> Result<CensusTotals, CensusError> {
    views
        .iter()
        .try_fold(CensusTotals::default(), |mut totals, view| {
            let add = |total: i64, value: i64, field: &'static str| {
                total
                    .checked_add(value)
                    .ok_or_else(|| CensusError::CountOverflow {
                        department: view.department.clone(),
                        field,
                    })
            };
            totals.departments += 1;
            totals.beds = add(totals.beds, view.beds, "beds")?;
            totals.patients = add(totals.patients, view.patients, "patients")?;
            totals.raw_empties = add(totals.raw_empties, view.raw_empties, "raw_empties")?;
            totals.closed = add(totals.closed, view.closed, "closed")?;
            totals.empties = add(totals.empties, view.empties, "empties")?;
            totals.temporarily_closed += u64::from(view.closed_temp);
            totals.permanently_closed += u64::from(view.closed_perm);
            Ok(totals)
        })
}

/// Returns the anomalies of `report` concerning `department`.
#[must_use]
pub fn anomalies_for<'a>(report: &'a CensusReport, department: &str) -> Vec<&'a Anomaly> {
    let key = reconcile::department_key(department);
    report
        .anomalies
        .iter()
        .filter(|a| reconcile::department_key(&a.department) == key)
        .collect()
}
