//! Tests for duplicate collapse and conflict detection

use super::{make_row, make_row_with_os, reconciler};
use crate::app::models::Cohort;
use crate::app::services::session_reconciler::SessionReconciler;
use crate::config::{Config, DuplicatePolicy};

#[test]
fn test_exact_duplicates_collapse_with_total_count() {
    // Two byte-identical rows for one identity collapse to one output row
    // with a total submission count of 2.
    let rows = vec![
        make_row("d1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-10"),
    ];

    let outcome = reconciler().reconcile(rows);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.kept[0].total_submissions, 2);
    assert!(outcome.conflicts.is_empty());

    let duplicates = outcome.stats.duplicates(Cohort::General);
    assert_eq!(duplicates.payloads, 1);
    assert_eq!(duplicates.total_rows, 2);
    assert_eq!(duplicates.removed(), 1);
}

#[test]
fn test_unique_rows_count_one() {
    let outcome = reconciler().reconcile(vec![make_row("d1", 100, 200, "2015-03-10")]);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.kept[0].total_submissions, 1);
    assert_eq!(outcome.stats.duplicates(Cohort::General).payloads, 0);
}

#[test]
fn test_submission_date_variants_resolve_to_earliest() {
    let rows = vec![
        make_row("d1", 100, 200, "2015-03-12"),
        make_row("d1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-11"),
    ];

    let outcome = reconciler().reconcile(rows);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.kept[0].submission_date, "2015-03-10");
    assert_eq!(outcome.kept[0].total_submissions, 3);
    assert!(outcome.conflicts.is_empty());
    assert_eq!(outcome.stats.conflicted_identities, 0);
}

#[test]
fn test_latest_submission_policy() {
    let config = Config::default().with_duplicate_policy(DuplicatePolicy::LatestSubmission);
    let reconciler = SessionReconciler::new(&config.reconciler).unwrap();

    let rows = vec![
        make_row("d1", 100, 200, "2015-03-12"),
        make_row("d1", 100, 200, "2015-03-10"),
    ];

    let outcome = reconciler.reconcile(rows);
    assert_eq!(outcome.kept[0].submission_date, "2015-03-12");
}

#[test]
fn test_conflicting_variants_surfaced_not_resolved() {
    // Same identity, different OS value: a genuine conflict. All variants
    // are surfaced and none is kept.
    let rows = vec![
        make_row_with_os("d1", 100, 200, "2015-03-10", "1.3"),
        make_row_with_os("d1", 100, 200, "2015-03-10", "2.0"),
    ];

    let outcome = reconciler().reconcile(rows);
    assert!(outcome.kept.is_empty());
    assert_eq!(outcome.conflicts.len(), 2);
    assert_eq!(outcome.stats.conflicted_identities, 1);
    assert_eq!(outcome.stats.conditions["multiple"].total_pings(), 1);
    assert!(outcome.kept_identities().is_empty());
}

#[test]
fn test_conflict_does_not_affect_other_identities() {
    let rows = vec![
        make_row_with_os("d1", 100, 200, "2015-03-10", "1.3"),
        make_row_with_os("d1", 100, 200, "2015-03-10", "2.0"),
        make_row("d1", 300, 400, "2015-03-10"),
    ];

    let outcome = reconciler().reconcile(rows);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.kept[0].identity.range(), (300, 400));
    assert_eq!(outcome.conflicts.len(), 2);
}

#[test]
fn test_duplicate_stats_partitioned_by_cohort() {
    let rows = vec![
        make_row("dogfood-1", 100, 200, "2015-03-10"),
        make_row("dogfood-1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-10"),
    ];

    let outcome = reconciler().reconcile(rows);
    assert_eq!(outcome.stats.duplicates(Cohort::Dogfood).total_rows, 2);
    assert_eq!(outcome.stats.duplicates(Cohort::General).total_rows, 3);
    assert_eq!(outcome.stats.duplicates(Cohort::General).removed(), 2);
}

#[test]
fn test_mixed_duplicates_and_date_variants() {
    // Two identical submissions on one date plus one on a later date:
    // earliest wins, total count covers all three.
    let rows = vec![
        make_row("d1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-10"),
        make_row("d1", 100, 200, "2015-03-12"),
    ];

    let outcome = reconciler().reconcile(rows);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.kept[0].submission_date, "2015-03-10");
    assert_eq!(outcome.kept[0].total_submissions, 3);
}
