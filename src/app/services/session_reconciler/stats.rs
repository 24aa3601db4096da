//! Reconciliation statistics
//!
//! Every outcome of session reconciliation is counted here, partitioned by
//! reporting cohort so internal test devices can be tracked separately from
//! the general population in the end-of-run report.

use crate::app::models::Cohort;
use std::collections::BTreeMap;

/// Duplicate-submission statistics for one cohort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateStats {
    /// Number of ping identities that had duplicate submissions
    pub payloads: u64,

    /// Total rows observed for those identities, duplicates included
    pub total_rows: u64,
}

impl DuplicateStats {
    /// Duplicate rows removed by collapsing
    pub fn removed(&self) -> u64 {
        self.total_rows.saturating_sub(self.payloads)
    }
}

/// Per-device occurrence counts for one reconciliation condition
#[derive(Debug, Clone, Default)]
pub struct ConditionStats {
    per_device: BTreeMap<String, (Cohort, u64)>,
}

impl ConditionStats {
    /// Count one occurrence for a device
    pub fn record(&mut self, device_id: &str, cohort: Cohort) {
        self.per_device
            .entry(device_id.to_string())
            .and_modify(|(_, count)| *count += 1)
            .or_insert((cohort, 1));
    }

    /// Total pings counted under this condition
    pub fn total_pings(&self) -> u64 {
        self.per_device.values().map(|(_, count)| count).sum()
    }

    /// Number of distinct devices affected
    pub fn device_count(&self) -> usize {
        self.per_device.len()
    }

    /// Pings counted for dogfood devices
    pub fn dogfood_pings(&self) -> u64 {
        self.per_device
            .values()
            .filter(|(cohort, _)| *cohort == Cohort::Dogfood)
            .map(|(_, count)| count)
            .sum()
    }

    /// Dogfood device IDs affected, in stable order
    pub fn dogfood_devices(&self) -> Vec<&str> {
        self.per_device
            .iter()
            .filter(|(_, (cohort, _))| *cohort == Cohort::Dogfood)
            .map(|(device, _)| device.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.per_device.is_empty()
    }
}

/// Complete statistics for one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileStats {
    /// Info rows fed into reconciliation
    pub input_rows: usize,

    /// Info rows surviving deduplication and timeline pruning
    pub kept_rows: usize,

    /// Ping identities with distinct conflicting rows
    pub conflicted_identities: usize,

    /// Duplicate-submission statistics for the dogfood cohort
    pub dogfood_duplicates: DuplicateStats,

    /// Duplicate-submission statistics for everyone else
    pub general_duplicates: DuplicateStats,

    /// Per-condition timeline statistics, keyed by condition name
    pub conditions: BTreeMap<&'static str, ConditionStats>,
}

impl ReconcileStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one timeline condition occurrence
    pub fn record_condition(&mut self, condition: &'static str, device_id: &str, cohort: Cohort) {
        self.conditions
            .entry(condition)
            .or_default()
            .record(device_id, cohort);
    }

    /// Count a collapsed duplicate group
    pub fn record_duplicates(&mut self, cohort: Cohort, total_rows: u64) {
        let stats = match cohort {
            Cohort::Dogfood => &mut self.dogfood_duplicates,
            Cohort::General => &mut self.general_duplicates,
        };
        stats.payloads += 1;
        stats.total_rows += total_rows;
    }

    /// Duplicate statistics for a cohort
    pub fn duplicates(&self, cohort: Cohort) -> DuplicateStats {
        match cohort {
            Cohort::Dogfood => self.dogfood_duplicates,
            Cohort::General => self.general_duplicates,
        }
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        let pruned: u64 = self
            .conditions
            .values()
            .map(ConditionStats::total_pings)
            .sum();
        format!(
            "Reconciliation: {} -> {} info rows | {} duplicate groups collapsed | \
             {} conflicted identities | {} timeline conditions",
            self.input_rows,
            self.kept_rows,
            self.dogfood_duplicates.payloads + self.general_duplicates.payloads,
            self.conflicted_identities,
            pruned,
        )
    }
}
