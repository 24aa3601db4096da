//! Duplicate collapse and conflict detection
//!
//! Devices resubmit payloads after connectivity failures, so the same ping
//! identity often arrives several times. Three cases must be kept apart:
//!
//! - exact duplicates collapse to one row, preserving the total submission
//!   count as an annotation distinct from the deduplicated row count
//! - rows differing only by submission date are the same measurement
//!   submitted on different days; the configured policy picks the winner
//! - rows differing by anything else are a genuine conflict; no winner is
//!   picked, all variants are surfaced for inspection, and derived rows for
//!   that identity are suppressed

use super::InfoRow;
use super::stats::ReconcileStats;
use crate::app::models::{Cohort, PingIdentity};
use crate::config::DuplicatePolicy;
use crate::constants::{conditions, fields};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of collapsing one batch of info rows
#[derive(Debug, Default)]
pub(crate) struct DedupResult {
    /// One row per surviving identity, with its total submission count
    pub unique: Vec<(InfoRow, u64)>,

    /// All variants of identities that conflicted
    pub conflicts: Vec<InfoRow>,
}

/// Collapse duplicate info rows per ping identity.
///
/// `cohort_of` classifies a device for partitioned statistics.
pub(crate) fn collapse_duplicates(
    rows: Vec<InfoRow>,
    policy: DuplicatePolicy,
    cohort_of: impl Fn(&str) -> Cohort,
    stats: &mut ReconcileStats,
) -> DedupResult {
    let mut groups: HashMap<PingIdentity, Vec<(InfoRow, u64)>> = HashMap::new();

    // Group rows by identity, collapsing exact duplicates as they arrive.
    for row in rows {
        let variants = groups.entry(row.identity.clone()).or_default();
        match variants.iter_mut().find(|(existing, _)| {
            existing.submission_date == row.submission_date && existing.record == row.record
        }) {
            Some((_, count)) => *count += 1,
            None => variants.push((row, 1)),
        }
    }

    let mut result = DedupResult::default();

    for (identity, mut variants) in groups {
        let cohort = cohort_of(&identity.device_id);
        let total: u64 = variants.iter().map(|(_, count)| count).sum();

        if total > 1 {
            stats.record_duplicates(cohort, total);
        }

        if variants.len() == 1 {
            let (row, _) = variants.pop().expect("variant group cannot be empty");
            result.unique.push((row, total));
            continue;
        }

        // Multiple distinct variants. If they only differ by submission
        // date they are resubmissions of one measurement; otherwise the
        // identity is ambiguous and no winner may be picked.
        let same_ignoring_submission = variants.windows(2).all(|pair| {
            pair[0]
                .0
                .record
                .equals_ignoring(&pair[1].0.record, &[fields::SUBMISSION_DATE])
        });

        if same_ignoring_submission {
            variants.sort_by(|(a, _), (b, _)| a.submission_date.cmp(&b.submission_date));
            let (winner, _) = match policy {
                DuplicatePolicy::EarliestSubmission => variants.swap_remove(0),
                DuplicatePolicy::LatestSubmission => {
                    let last = variants.len() - 1;
                    variants.swap_remove(last)
                }
            };
            debug!(
                "Resolved {} submission-date variants for {:?} by {:?}",
                total, identity, policy
            );
            result.unique.push((winner, total));
        } else {
            warn!(
                "Conflicting info rows for {:?}: {} distinct variants",
                identity,
                variants.len()
            );
            stats.conflicted_identities += 1;
            stats.record_condition(conditions::MULTIPLE_INFO, &identity.device_id, cohort);
            result
                .conflicts
                .extend(variants.into_iter().map(|(row, _)| row));
        }
    }

    result
}
