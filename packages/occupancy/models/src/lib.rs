#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Department occupancy summary types and census configuration.
//!
//! Field names on the output types match the dashboard's JSON contract
//! (`beds`, `patients`, `empties`, `days_since_last_discharge`,
//! `closed_temp`, `closed_perm`, `modified_at`, `closed`), so they are
//! serialized in `snake_case` rather than renamed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use ward_census_location_models::{CensusTimestamp, DEFAULT_EXCLUDED_BEDS};

/// Value of `days_since_last_discharge` when no bed in a department has
/// ever reported a discharge. Distinct from zero days.
pub const NO_DISCHARGE_SENTINEL: i64 = -999;

/// Inferred closure state of a department.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureVerdict {
    /// In service, or not enough evidence to call it closed.
    Open,
    /// Empty and recently taken offline.
    TemporarilyClosed,
    /// Empty for a long stretch, or with no discharge history at all.
    PermanentlyClosed,
}

impl ClosureVerdict {
    /// The `closed_temp` flag.
    #[must_use]
    pub const fn closed_temp(self) -> bool {
        matches!(self, Self::TemporarilyClosed)
    }

    /// The `closed_perm` flag.
    #[must_use]
    pub const fn closed_perm(self) -> bool {
        matches!(self, Self::PermanentlyClosed)
    }
}

/// Day-count boundaries used by the closure classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureThresholds {
    /// More than this many days since the last discharge (with nobody
    /// admitted) means permanently closed.
    pub permanent_after_days: i64,
    /// More than this many days (up to `permanent_after_days`) means
    /// temporarily closed.
    pub temporary_after_days: i64,
}

impl Default for ClosureThresholds {
    fn default() -> Self {
        Self {
            permanent_after_days: 30,
            temporary_after_days: 2,
        }
    }
}

/// Explicit configuration for one census computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensusConfig {
    /// Bed names (compared case-insensitively) that are not physical beds.
    pub excluded_beds: BTreeSet<String>,
    /// Whether permanently closed departments appear in the output.
    pub include_permanently_closed: bool,
    /// Closure classifier boundaries.
    pub thresholds: ClosureThresholds,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            excluded_beds: DEFAULT_EXCLUDED_BEDS
                .iter()
                .map(|bed| (*bed).to_string())
                .collect(),
            include_permanently_closed: true,
            thresholds: ClosureThresholds::default(),
        }
    }
}

/// Occupancy summary for one department, before registry reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    /// Department display name (aggregation key).
    pub department: String,
    /// Location rows counted after filtering.
    pub beds: i64,
    /// Rows with a patient assigned.
    pub patients: i64,
    /// `beds - patients`. Never clamped.
    pub empties: i64,
    /// Whole days between the latest `modified_at` and the latest
    /// discharge, truncated. [`NO_DISCHARGE_SENTINEL`] when unknown.
    pub days_since_last_discharge: i64,
    /// Inferred temporary closure.
    pub closed_temp: bool,
    /// Inferred permanent closure.
    pub closed_perm: bool,
    /// Latest `modified_at` among contributing rows.
    pub modified_at: CensusTimestamp,
}

impl DepartmentSummary {
    /// Returns `true` if any bed in the department reported a discharge.
    #[must_use]
    pub const fn has_discharge_history(&self) -> bool {
        self.days_since_last_discharge != NO_DISCHARGE_SENTINEL
    }

    /// The closure verdict encoded by the two flags.
    #[must_use]
    pub const fn verdict(&self) -> ClosureVerdict {
        if self.closed_perm {
            ClosureVerdict::PermanentlyClosed
        } else if self.closed_temp {
            ClosureVerdict::TemporarilyClosed
        } else {
            ClosureVerdict::Open
        }
    }
}

/// A human-curated count of closed beds within a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedBedOverride {
    /// Department name as curated in the bed registry.
    pub department: String,
    /// Number of beds the registry reports as closed.
    #[serde(alias = "closed")]
    pub closed_count: i64,
}

/// Final per-department view consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledDepartmentView {
    /// Department display name.
    pub department: String,
    /// Location rows counted after filtering.
    pub beds: i64,
    /// Rows with a patient assigned.
    pub patients: i64,
    /// Automatic empties minus registry-closed beds. Never clamped.
    pub empties: i64,
    /// Automatic empties before the registry adjustment.
    pub raw_empties: i64,
    /// See [`DepartmentSummary::days_since_last_discharge`].
    pub days_since_last_discharge: i64,
    /// Inferred temporary closure.
    pub closed_temp: bool,
    /// Inferred permanent closure.
    pub closed_perm: bool,
    /// Latest `modified_at` among contributing rows.
    pub modified_at: CensusTimestamp,
    /// Registry-closed beds, summed across matching overrides; 0 if none,
    /// or if another spelling of the department already took them.
    pub closed: i64,
}

/// Data-quality signals surfaced alongside the census.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// More patients than beds in the automatic count.
    NegativeEmpties,
    /// Registry closures exceed the automatic empty count.
    NegativeReconciledEmpties,
    /// More than one override row matched a department; counts were summed.
    DuplicateOverride,
    /// An override named a department absent from the census.
    UnmatchedOverride,
    /// Several departments share one join key; the override was applied to
    /// the first of them only.
    AmbiguousOverride,
}

/// One flagged data-quality condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Department the condition was observed on.
    pub department: String,
    /// What was observed.
    pub kind: AnomalyKind,
    /// The offending value (empties, override count, or number of rows).
    /// For `AMBIGUOUS_OVERRIDE`, the override count that was not applied.
    pub value: i64,
}

/// Hospital-wide sums over the departments in a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusTotals {
    /// Number of departments.
    pub departments: u64,
    /// Total beds.
    pub beds: i64,
    /// Total patients.
    pub patients: i64,
    /// Total automatic empties.
    pub raw_empties: i64,
    /// Total registry-closed beds.
    pub closed: i64,
    /// Total reconciled empties.
    pub empties: i64,
    /// Departments inferred temporarily closed.
    pub temporarily_closed: u64,
    /// Departments inferred permanently closed.
    pub permanently_closed: u64,
}

/// Complete output of one census computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusReport {
    /// Per-department views, ordered by department name.
    pub departments: Vec<ReconciledDepartmentView>,
    /// Sums over `departments`.
    pub totals: CensusTotals,
    /// Data-quality conditions found along the way.
    pub anomalies: Vec<Anomaly>,
}
