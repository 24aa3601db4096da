//! Dogfood device summarization
//!
//! Internal test devices get a closer look than the general population:
//! per device, a summary of its reconciled sessions (measurement span,
//! submission span, ping count, whether the reported device info changed),
//! and its app usage aggregated per (usage date, app URL).

use super::ReconciledInfo;
use crate::app::models::{Cohort, PingIdentity};
use crate::app::services::payload_shaper::{AppUsageRow, SearchRow};
use crate::constants::AU_INFO_FIELD_KEYS;
use std::collections::{BTreeMap, HashMap};

/// Per-device session summary for one dogfood device
#[derive(Debug, Clone, PartialEq)]
pub struct DogfoodDeviceSummary {
    pub device_id: String,

    /// Start of the earliest kept measurement window (ms epoch)
    pub earliest_start: i64,

    /// Stop of the latest kept measurement window (ms epoch)
    pub latest_stop: i64,

    /// Earliest non-empty submission date (ISO), or empty
    pub earliest_submission: String,

    /// Latest non-empty submission date (ISO), or empty
    pub latest_submission: String,

    /// Number of kept pings
    pub num_pings: u64,

    /// Whether the device-info fields changed between pings
    pub changed_info: bool,

    /// Device-info field values from the latest ping, in
    /// [`AU_INFO_FIELD_KEYS`] order
    pub latest_info: Vec<String>,
}

/// Per-device app usage aggregated over the kept sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DogfoodAppUsage {
    pub device_id: String,
    pub usage_date: String,
    pub app_url: String,
    pub usage_time_s: i64,
    pub invocations: i64,
    pub installs: i64,
    pub uninstalls: i64,

    /// Activity strings of the aggregated rows, joined with `;`
    pub activities: String,
}

/// Summarize the kept sessions of every dogfood device.
///
/// Results are ordered by device ID; each device's pings are walked in
/// (start, stop) order.
pub fn summarize_dogfood_devices(kept: &[ReconciledInfo]) -> Vec<DogfoodDeviceSummary> {
    let mut by_device: BTreeMap<&str, Vec<&ReconciledInfo>> = BTreeMap::new();
    for row in kept {
        if row.cohort == Cohort::Dogfood {
            by_device
                .entry(row.identity.device_id.as_str())
                .or_default()
                .push(row);
        }
    }

    let mut summaries = Vec::new();
    for (device_id, mut rows) in by_device {
        rows.sort_by(|a, b| a.identity.cmp(&b.identity));

        let first = rows.first().expect("device group cannot be empty");
        let last = rows.last().expect("device group cannot be empty");

        let mut submissions: Vec<&str> = rows
            .iter()
            .map(|row| row.submission_date.as_str())
            .filter(|date| !date.is_empty())
            .collect();
        submissions.sort();

        let info_sets: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.record.to_ordered_values(AU_INFO_FIELD_KEYS))
            .collect();
        let changed_info = info_sets.windows(2).any(|pair| pair[0] != pair[1]);

        summaries.push(DogfoodDeviceSummary {
            device_id: device_id.to_string(),
            earliest_start: first.identity.start,
            latest_stop: last.identity.stop,
            earliest_submission: submissions.first().copied().unwrap_or("").to_string(),
            latest_submission: submissions.last().copied().unwrap_or("").to_string(),
            num_pings: rows.len() as u64,
            changed_info,
            latest_info: info_sets.last().cloned().unwrap_or_default(),
        });
    }

    summaries
}

/// Aggregate app usage per (device, usage date, app URL) over the kept
/// sessions of the dogfood devices.
///
/// The four usage metrics sum; activity strings join with `;`.
pub fn aggregate_dogfood_appusage(
    kept: &[ReconciledInfo],
    derived: &HashMap<PingIdentity, (Vec<AppUsageRow>, Vec<SearchRow>)>,
) -> Vec<DogfoodAppUsage> {
    let mut aggregated: BTreeMap<(String, String, String), DogfoodAppUsage> = BTreeMap::new();

    for row in kept {
        if row.cohort != Cohort::Dogfood {
            continue;
        }
        let Some((apps, _)) = derived.get(&row.identity) else {
            continue;
        };

        for app in apps {
            let key = (
                row.identity.device_id.clone(),
                app.usage_date.clone(),
                app.app_url.clone(),
            );
            let entry = aggregated.entry(key).or_insert_with(|| DogfoodAppUsage {
                device_id: row.identity.device_id.clone(),
                usage_date: app.usage_date.clone(),
                app_url: app.app_url.clone(),
                usage_time_s: 0,
                invocations: 0,
                installs: 0,
                uninstalls: 0,
                activities: String::new(),
            });
            entry.usage_time_s += app.usage_time_s;
            entry.invocations += app.invocations;
            entry.installs += app.installs;
            entry.uninstalls += app.uninstalls;
            if !app.activities.is_empty() {
                if entry.activities.is_empty() {
                    entry.activities = app.activities.clone();
                } else {
                    entry.activities = format!("{};{}", entry.activities, app.activities);
                }
            }
        }
    }

    aggregated.into_values().collect()
}
