//! Occurrence counting for output rows
//!
//! The output of a run is a set of counted tuples: each distinct
//! combination of field values maps to the number of records that produced
//! it. Counting is additive, so partial tables built by independent workers
//! merge into the same result as one global pass (combiner/reducer
//! equivalence), and no ordering guarantee is needed anywhere.
//!
//! Diagnostics use the same mechanism with reserved tags: counters
//! (optionally grouped) and named condition counts.

use crate::constants::tags;
use std::collections::BTreeMap;
use std::collections::HashMap;

pub mod rollup;

pub use rollup::expand_all;

/// Tag identifying the kind of an output row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowTag {
    /// FTU counted tuple
    Datum,
    /// AU device/session info row
    Info,
    /// AU per-app usage row
    App,
    /// AU per-provider search row
    Search,
}

impl RowTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowTag::Datum => tags::DATUM,
            RowTag::Info => tags::INFO,
            RowTag::App => tags::APP,
            RowTag::Search => tags::SEARCH,
        }
    }
}

impl std::fmt::Display for RowTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key of one counted output row: its tag plus the ordered field values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputKey {
    pub tag: RowTag,
    pub fields: Vec<String>,
}

impl OutputKey {
    pub fn new(tag: RowTag, fields: Vec<String>) -> Self {
        Self { tag, fields }
    }
}

/// Additive table of occurrence counts per distinct output key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountTable {
    counts: HashMap<OutputKey, u64>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of a key
    pub fn record(&mut self, key: OutputKey) {
        self.add(key, 1);
    }

    /// Count `n` occurrences of a key
    pub fn add(&mut self, key: OutputKey, n: u64) {
        *self.counts.entry(key).or_insert(0) += n;
    }

    /// Merge another table into this one (key-wise sum).
    ///
    /// Addition is commutative and associative, so partial tables may be
    /// merged in any order.
    pub fn merge(&mut self, other: CountTable) {
        for (key, count) in other.counts {
            self.add(key, count);
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total occurrences across all keys
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Look up the count for a key
    pub fn get(&self, key: &OutputKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Drain into (key, count) rows in deterministic order
    pub fn into_sorted_rows(self) -> Vec<(OutputKey, u64)> {
        let sorted: BTreeMap<OutputKey, u64> = self.counts.into_iter().collect();
        sorted.into_iter().collect()
    }

    /// Iterate over (key, count) entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&OutputKey, &u64)> {
        self.counts.iter()
    }
}

/// Diagnostic counters and condition counts for one run (or one worker)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCounters {
    counters: HashMap<(String, Option<String>), u64>,
    conditions: HashMap<String, u64>,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a named counter
    pub fn increment(&mut self, name: &str, n: u64) {
        *self
            .counters
            .entry((name.to_string(), None))
            .or_insert(0) += n;
    }

    /// Increment a named counter within a group
    pub fn increment_grouped(&mut self, name: &str, group: &str, n: u64) {
        *self
            .counters
            .entry((name.to_string(), Some(group.to_string())))
            .or_insert(0) += n;
    }

    /// Count one occurrence of a named condition
    pub fn record_condition(&mut self, condition: impl Into<String>) {
        *self.conditions.entry(condition.into()).or_insert(0) += 1;
    }

    /// Merge another counter set into this one (key-wise sum)
    pub fn merge(&mut self, other: RunCounters) {
        for (key, count) in other.counters {
            *self.counters.entry(key).or_insert(0) += count;
        }
        for (condition, count) in other.conditions {
            *self.conditions.entry(condition).or_insert(0) += count;
        }
    }

    /// Counter value by name (ungrouped)
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .get(&(name.to_string(), None))
            .copied()
            .unwrap_or(0)
    }

    /// Condition count by name
    pub fn condition(&self, name: &str) -> u64 {
        self.conditions.get(name).copied().unwrap_or(0)
    }

    /// All counters in deterministic order: (name, group, count)
    pub fn sorted_counters(&self) -> Vec<(String, Option<String>, u64)> {
        let mut entries: Vec<_> = self
            .counters
            .iter()
            .map(|((name, group), count)| (name.clone(), group.clone(), *count))
            .collect();
        entries.sort();
        entries
    }

    /// All condition counts in deterministic order
    pub fn sorted_conditions(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<_> = self
            .conditions
            .iter()
            .map(|(condition, count)| (condition.clone(), *count))
            .collect();
        entries.sort();
        entries
    }

    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }
}
