//! Closure classification for a single department.
//!
//! Permanent conditions are checked first, so a department never comes
//! out both temporarily and permanently closed. Any admitted patient keeps
//! a department open regardless of discharge recency.

use ward_census_occupancy_models::{ClosureThresholds, ClosureVerdict};

/// Classifies a department from its discharge recency and occupancy.
///
/// | condition (all with `patients == 0`)           | verdict               |
/// |------------------------------------------------|-----------------------|
/// | `days > permanent_after_days`                  | permanently closed    |
/// | `days < 0` (includes the `-999` sentinel)      | permanently closed    |
/// | `temporary_after_days < days <= permanent...`  | temporarily closed    |
/// | anything else                                  | open                  |
#[must_use]
pub const fn classify(
    days_since_last_discharge: i64,
    patients: i64,
    thresholds: &ClosureThresholds,
) -> ClosureVerdict {
    if patients != 0 {
        return ClosureVerdict::Open;
    }

    if days_since_last_discharge > thresholds.permanent_after_days
        || days_since_last_discharge < 0
    {
        ClosureVerdict::PermanentlyClosed
    } else if days_since_last_discharge > thresholds.temporary_after_days {
        ClosureVerdict::TemporarilyClosed
    } else {
        ClosureVerdict::Open
    }
}
