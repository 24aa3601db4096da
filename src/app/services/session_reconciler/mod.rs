//! Session/ping reconciliation
//!
//! This module joins the repeated pings of each device into a consistent
//! timeline and produces the deduplicated, annotated info-row set that the
//! output tables are built from. It requires full visibility into a
//! device's sessions, so it runs single-threaded over the complete info-row
//! set of a run (device groups are independent and could be parallelized,
//! but the per-device work is trivial).
//!
//! # Pipeline
//!
//! 1. Collapse duplicate submissions per ping identity ([`dedup`]):
//!    exact duplicates merge with their total count preserved,
//!    submission-date-only variants resolve by policy, genuine conflicts
//!    are surfaced and never resolved automatically.
//! 2. Prune each device's timeline ([`overlap`]): clock-skewed and nested
//!    pings are removed, tolerated overlaps are tagged and kept.
//!
//! All outcomes are counted per cohort in [`stats::ReconcileStats`].

use crate::app::models::{Cohort, NormalizedRecord, PingIdentity};
use crate::config::ReconcilerConfig;
use crate::{Result, Error};
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

pub mod dedup;
pub mod dogfood;
pub mod overlap;
pub mod stats;

#[cfg(test)]
pub mod tests;

pub use dogfood::{
    DogfoodAppUsage, DogfoodDeviceSummary, aggregate_dogfood_appusage, summarize_dogfood_devices,
};
pub use stats::{ConditionStats, DuplicateStats, ReconcileStats};

/// One shaped info row entering reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    /// Ping identity: (device, start, stop)
    pub identity: PingIdentity,

    /// Submission date (ISO), empty when the envelope carried none
    pub submission_date: String,

    /// The device/session fields
    pub record: NormalizedRecord,
}

/// Overlap annotation on a kept info row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapTag {
    /// No overlap with the previous kept ping
    #[default]
    None,
    /// Overlap within tolerance
    Negligible,
    /// Overlap beyond tolerance, reported but kept
    NonTrivial,
}

/// One reconciled info row
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledInfo {
    pub identity: PingIdentity,
    pub submission_date: String,
    pub record: NormalizedRecord,

    /// Cohort the device belongs to
    pub cohort: Cohort,

    /// Total submissions observed for this identity, duplicates included
    pub total_submissions: u64,

    /// Overlap annotation from timeline pruning
    pub overlap: OverlapTag,
}

/// Complete result of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Deduplicated, pruned, annotated info rows
    pub kept: Vec<ReconciledInfo>,

    /// All variants of conflicted identities, for manual inspection
    pub conflicts: Vec<InfoRow>,

    /// Statistics partitioned by cohort
    pub stats: ReconcileStats,
}

impl ReconcileOutcome {
    /// Identities of the kept rows.
    ///
    /// Derived (app/search) rows are only valid for these identities:
    /// conflicted identities are ambiguous and pruned pings are gone.
    pub fn kept_identities(&self) -> HashSet<&PingIdentity> {
        self.kept.iter().map(|row| &row.identity).collect()
    }
}

/// Session reconciler for one run
#[derive(Debug)]
pub struct SessionReconciler {
    config: ReconcilerConfig,
    dogfood_pattern: Regex,
}

impl SessionReconciler {
    /// Create a reconciler from configuration
    pub fn new(config: &ReconcilerConfig) -> Result<Self> {
        if config.overlap_tolerance_ms < 0 {
            return Err(Error::configuration(
                "overlap_tolerance_ms must be non-negative",
            ));
        }
        Ok(Self {
            dogfood_pattern: config.dogfood_regex()?,
            config: config.clone(),
        })
    }

    /// Classify a device into its reporting cohort
    pub fn cohort(&self, device_id: &str) -> Cohort {
        if self.dogfood_pattern.is_match(device_id) {
            Cohort::Dogfood
        } else {
            Cohort::General
        }
    }

    /// Reconcile the complete info-row set of one run.
    pub fn reconcile(&self, rows: Vec<InfoRow>) -> ReconcileOutcome {
        let mut stats = ReconcileStats::new();
        stats.input_rows = rows.len();

        info!("Reconciling {} info rows", rows.len());

        // Step 1: collapse duplicates and separate conflicts.
        let deduped = dedup::collapse_duplicates(
            rows,
            self.config.duplicate_policy,
            |device_id| self.cohort(device_id),
            &mut stats,
        );

        let annotated: Vec<ReconciledInfo> = deduped
            .unique
            .into_iter()
            .map(|(row, total_submissions)| ReconciledInfo {
                cohort: self.cohort(&row.identity.device_id),
                identity: row.identity,
                submission_date: row.submission_date,
                record: row.record,
                total_submissions,
                overlap: OverlapTag::None,
            })
            .collect();

        // Step 2: prune each device's timeline.
        let kept = overlap::prune_timelines(
            annotated,
            self.config.overlap_tolerance_ms,
            &mut stats,
        );

        stats.kept_rows = kept.len();
        info!("{}", stats.summary());

        ReconcileOutcome {
            kept,
            conflicts: deduped.conflicts,
            stats,
        }
    }
}
