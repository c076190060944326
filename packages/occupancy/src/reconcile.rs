//! Reconciliation of inferred department state with the bed registry.
//!
//! The registry is a human-curated list of closed-bed counts per
//! department. It is left-joined onto the automatic summaries: a
//! department without an override gets `closed = 0`, several overrides
//! for the same department are summed, and reconciled `empties` is the
//! automatic count minus `closed` with no clamping.
//!
//! Department names in the registry are curated by hand and drift in case
//! and spacing, so the join compares [`department_key`]s instead of raw
//! strings. Each override key is applied at most once: if the feed itself
//! spells one department several ways, the first spelling in summary order
//! receives the closed count and the others are reported as
//! `AMBIGUOUS_OVERRIDE`.

use std::collections::BTreeMap;

use ward_census_occupancy_models::{
    Anomaly, AnomalyKind, ClosedBedOverride, DepartmentSummary, ReconciledDepartmentView,
};

use crate::CensusError;

/// Output of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// One view per input summary, in input order.
    pub views: Vec<ReconciledDepartmentView>,
    /// Negative counts, duplicate, ambiguous and unmatched overrides.
    pub anomalies: Vec<Anomaly>,
}

/// Normalized department name used for joining: trimmed, internal
/// whitespace collapsed to single spaces, uppercased.
#[must_use]
pub fn department_key(department: &str) -> String {
    department
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Registry overrides accumulated per join key.
struct OverrideTotal<'a> {
    department: &'a str,
    closed: i64,
    rows: i64,
}

/// Sums override rows per join key.
///
/// # Errors
///
/// Returns [`CensusError::InvalidOverride`] for a negative count and
/// [`CensusError::CountOverflow`] if a sum leaves the `i64` range.
fn sum_overrides(
    overrides: &[ClosedBedOverride],
) -> Result<BTreeMap<String, OverrideTotal<'_>>, CensusError> {
    let mut totals: BTreeMap<String, OverrideTotal<'_>> = BTreeMap::new();
    for row in overrides {
        if row.closed_count < 0 {
            return Err(CensusError::InvalidOverride {
                department: row.department.clone(),
                closed_count: row.closed_count,
            });
        }
        let total = totals
            .entry(department_key(&row.department))
            .or_insert(OverrideTotal {
                department: &row.department,
                closed: 0,
                rows: 0,
            });
        total.closed =
            total
                .closed
                .checked_add(row.closed_count)
                .ok_or_else(|| CensusError::CountOverflow {
                    department: row.department.clone(),
                    field: "closed",
                })?;
        total.rows += 1;
    }
    Ok(totals)
}

/// Left-joins `overrides` onto `summaries` and recomputes empties.
///
/// # Errors
///
/// Returns [`CensusError::InvalidOverride`] if an override count is
/// negative, and [`CensusError::CountOverflow`] if summing overrides or
/// subtracting them from empties leaves the `i64` range.
pub fn reconcile(
    summaries: Vec<DepartmentSummary>,
    overrides: &[ClosedBedOverride],
) -> Result<Reconciliation, CensusError> {
    let totals = sum_overrides(overrides)?;
    let mut anomalies = Vec::new();

    for total in totals.values().filter(|t| t.rows > 1) {
        log::warn!(
            "{} override rows for department '{}', summing to {} closed",
            total.rows,
            total.department,
            total.closed
        );
        anomalies.push(Anomaly {
            department: total.department.to_string(),
            kind: AnomalyKind::DuplicateOverride,
            value: total.rows,
        });
    }

    // Join key -> department spelling that received the override.
    let mut matched: BTreeMap<String, String> = BTreeMap::new();
    let mut views = Vec::with_capacity(summaries.len());

    for summary in summaries {
        let key = department_key(&summary.department);
        let first = matched.get(&key).cloned();
        let closed = match (totals.get(&key), first) {
            (None, _) => 0,
            (Some(total), None) => {
                matched.insert(key, summary.department.clone());
                total.closed
            }
            (Some(total), Some(first)) => {
                log::warn!(
                    "Override for '{}' already applied to '{first}', not applying to '{}'",
                    total.department,
                    summary.department
                );
                anomalies.push(Anomaly {
                    department: summary.department.clone(),
                    kind: AnomalyKind::AmbiguousOverride,
                    value: total.closed,
                });
                0
            }
        };

        let view = apply_override(summary, closed)?;

        if view.raw_empties < 0 {
            anomalies.push(Anomaly {
                department: view.department.clone(),
                kind: AnomalyKind::NegativeEmpties,
                value: view.raw_empties,
            });
        }
        if view.empties < 0 {
            log::warn!(
                "{}: registry reports {} closed bed(s) but only {} empty, reconciled empties={}",
                view.department,
                closed,
                view.raw_empties,
                view.empties
            );
            anomalies.push(Anomaly {
                department: view.department.clone(),
                kind: AnomalyKind::NegativeReconciledEmpties,
                value: view.empties,
            });
        }

        views.push(view);
    }

    for (key, total) in &totals {
        if !matched.contains_key(key) {
            log::warn!(
                "Override for unknown department '{}' ({} closed) ignored",
                total.department,
                total.closed
            );
            anomalies.push(Anomaly {
                department: total.department.to_string(),
                kind: AnomalyKind::UnmatchedOverride,
                value: total.closed,
            });
        }
    }

    Ok(Reconciliation { views, anomalies })
}

/// Builds the final view for one department given its summed override.
///
/// # Errors
///
/// Returns [`CensusError::CountOverflow`] if `empties - closed` leaves the
/// `i64` range.
pub fn apply_override(
    summary: DepartmentSummary,
    closed: i64,
) -> Result<ReconciledDepartmentView, CensusError> {
    let Some(empties) = summary.empties.checked_sub(closed) else {
        return Err(CensusError::CountOverflow {
            department: summary.department,
            field: "empties",
        });
    };

    Ok(ReconciledDepartmentView {
        empties,
        raw_empties: summary.empties,
        department: summary.department,
        beds: summary.beds,
        patients: summary.patients,
        days_since_last_discharge: summary.days_since_last_discharge,
        closed_temp: summary.closed_temp,
        closed_perm: summary.closed_perm,
        modified_at: summary.modified_at,
        closed,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;

    fn summary(department: &str, beds: i64, patients: i64) -> DepartmentSummary {
        DepartmentSummary {
            department: department.to_string(),
            beds,
            patients,
            empties: beds - patients,
            days_since_last_discharge: 5,
            closed_temp: false,
            closed_perm: false,
            modified_at: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap().into(),
        }
    }

    fn closed(department: &str, count: i64) -> ClosedBedOverride {
        ClosedBedOverride {
            department: department.to_string(),
            closed_count: count,
        }
    }

    fn kinds(r: &Reconciliation) -> Vec<AnomalyKind> {
        r.anomalies.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn normalizes_join_keys() {
        assert_eq!(department_key("  icu   b "), "ICU B");
        assert_eq!(department_key("ICU B"), department_key("Icu\tB"));
    }

    #[test]
    fn subtracts_override_from_empties() {
        let r = reconcile(vec![summary("ICU-B", 5, 0)], &[closed("ICU-B", 2)]).unwrap();
        assert_eq!(r.views[0].closed, 2);
        assert_eq!(r.views[0].raw_empties, 5);
        assert_eq!(r.views[0].empties, 3);
        assert!(r.anomalies.is_empty());
    }

    #[test]
    fn missing_override_defaults_to_zero() {
        let r = reconcile(vec![summary("ICU-A", 10, 4)], &[]).unwrap();
        assert_eq!(r.views[0].closed, 0);
        assert_eq!(r.views[0].empties, 6);
    }

    #[test]
    fn keeps_summary_fields() {
        let s = summary("ICU-A", 10, 4);
        let r = reconcile(vec![s.clone()], &[closed("ICU-A", 1)]).unwrap();
        let v = &r.views[0];
        assert_eq!(v.department, s.department);
        assert_eq!(v.beds, s.beds);
        assert_eq!(v.patients, s.patients);
        assert_eq!(v.days_since_last_discharge, s.days_since_last_discharge);
        assert_eq!(v.modified_at, s.modified_at);
    }

    #[test]
    fn does_not_clamp_negative_empties() {
        let r = reconcile(vec![summary("ICU-B", 5, 2)], &[closed("ICU-B", 5)]).unwrap();
        assert_eq!(r.views[0].empties, -2);
        assert_eq!(kinds(&r), vec![AnomalyKind::NegativeReconciledEmpties]);
        assert_eq!(r.anomalies[0].value, -2);
    }

    #[test]
    fn flags_negative_raw_empties() {
        let mut corrupt = summary("BAD", 2, 3);
        corrupt.empties = -1;
        let r = reconcile(vec![corrupt], &[]).unwrap();
        assert_eq!(
            kinds(&r),
            vec![
                AnomalyKind::NegativeEmpties,
                AnomalyKind::NegativeReconciledEmpties
            ]
        );
    }

    #[test]
    fn sums_duplicate_overrides() {
        let r = reconcile(
            vec![summary("ICU-B", 10, 0)],
            &[closed("ICU-B", 2), closed("icu-b ", 3)],
        )
        .unwrap();
        assert_eq!(r.views[0].closed, 5);
        assert_eq!(r.views[0].empties, 5);
        assert_eq!(kinds(&r), vec![AnomalyKind::DuplicateOverride]);
        assert_eq!(r.anomalies[0].value, 2);
    }

    #[test]
    fn matches_across_case_and_spacing() {
        let r = reconcile(
            vec![summary("Ward  7 North", 8, 2)],
            &[closed("WARD 7 NORTH", 1)],
        )
        .unwrap();
        assert_eq!(r.views[0].closed, 1);
        assert!(r.anomalies.is_empty());
    }

    #[test]
    fn reports_unmatched_override() {
        let r = reconcile(vec![summary("ICU-A", 4, 4)], &[closed("ICU-Z", 3)]).unwrap();
        assert_eq!(r.views[0].closed, 0);
        assert_eq!(kinds(&r), vec![AnomalyKind::UnmatchedOverride]);
        assert_eq!(r.anomalies[0].department, "ICU-Z");
        assert_eq!(r.anomalies[0].value, 3);
    }

    #[test]
    fn applies_override_once_across_spellings() {
        let r = reconcile(
            vec![summary("ICU B", 2, 0), summary("icu b", 1, 0)],
            &[closed("ICU B", 2)],
        )
        .unwrap();
        assert_eq!(r.views[0].closed, 2);
        assert_eq!(r.views[0].empties, 0);
        assert_eq!(r.views[1].closed, 0);
        assert_eq!(r.views[1].empties, 1);
        assert_eq!(kinds(&r), vec![AnomalyKind::AmbiguousOverride]);
        assert_eq!(r.anomalies[0].department, "icu b");
        assert_eq!(r.anomalies[0].value, 2);
    }

    #[test]
    fn rejects_negative_override() {
        let err = reconcile(vec![summary("ICU-B", 5, 0)], &[closed("ICU-B", -3)]).unwrap_err();
        assert!(matches!(
            err,
            CensusError::InvalidOverride {
                closed_count: -3,
                ..
            }
        ));
        assert!(err.to_string().contains("ICU-B"));
    }

    #[test]
    fn overflowing_override_sum_is_an_error() {
        let err = reconcile(
            vec![summary("ICU-B", 5, 0)],
            &[closed("ICU-B", i64::MAX), closed("ICU-B", 1)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CensusError::CountOverflow {
                field: "closed",
                ..
            }
        ));
    }

    #[test]
    fn overflowing_empties_is_an_error() {
        let mut corrupt = summary("BAD", 0, 0);
        corrupt.empties = -2;
        let err = reconcile(vec![corrupt], &[closed("BAD", i64::MAX)]).unwrap_err();
        assert!(matches!(
            err,
            CensusError::CountOverflow {
                field: "empties",
                ..
            }
        ));
    }

    #[test]
    fn preserves_summary_order() {
        let r = reconcile(
            vec![summary("A", 1, 0), summary("B", 1, 0), summary("C", 1, 0)],
            &[closed("B", 1)],
        )
        .unwrap();
        let names: Vec<&str> = r.views.iter().map(|v| v.department.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
