//! Device timeline pruning
//!
//! Ping time ranges from one device should be sequential: each start no
//! earlier than the previous stop. Real devices violate this in four ways,
//! each handled differently:
//!
//! - start after stop: internally inconsistent (clock changed mid-session
//!   or a bug); the ping is removed
//! - range fully contained in an already-kept range: redundant; removed
//! - overlap within tolerance: expected clock fuzz; kept, counted
//! - non-trivial overlap: a bug condition, but ambiguous real-world clock
//!   behavior should not destroy data; kept, counted for investigation

use super::{OverlapTag, ReconciledInfo};
use crate::constants::conditions;
use super::stats::ReconcileStats;
use std::collections::HashMap;
use tracing::debug;

/// Prune each device's timeline, tagging tolerated overlaps.
///
/// Rows must already be deduplicated per identity. Within each device the
/// rows are sorted by (start ascending, stop ascending) and walked against
/// the last kept ping.
pub(crate) fn prune_timelines(
    rows: Vec<ReconciledInfo>,
    overlap_tolerance_ms: i64,
    stats: &mut ReconcileStats,
) -> Vec<ReconciledInfo> {
    let mut by_device: HashMap<String, Vec<ReconciledInfo>> = HashMap::new();
    for row in rows {
        by_device
            .entry(row.identity.device_id.clone())
            .or_default()
            .push(row);
    }

    let mut kept_rows = Vec::new();

    for (device_id, mut device_rows) in by_device {
        device_rows.sort_by(|a, b| a.identity.cmp(&b.identity));

        let mut kept: Vec<ReconciledInfo> = Vec::new();
        for mut candidate in device_rows {
            if candidate.identity.has_clock_skew() {
                stats.record_condition(conditions::CLOCK_SKEW, &device_id, candidate.cohort);
                continue;
            }

            if let Some(last) = kept.last() {
                let last_stop = last.identity.stop;
                if candidate.identity.start < last_stop {
                    if candidate.identity.stop <= last_stop {
                        // Fully contained in the kept range: redundant.
                        stats.record_condition(conditions::NESTED, &device_id, candidate.cohort);
                        continue;
                    }
                    let overlap_ms = last_stop - candidate.identity.start;
                    if overlap_ms < overlap_tolerance_ms {
                        stats.record_condition(
                            conditions::NEGLIGIBLE_OVERLAP,
                            &device_id,
                            candidate.cohort,
                        );
                        candidate.overlap = OverlapTag::Negligible;
                    } else {
                        stats.record_condition(conditions::OVERLAP, &device_id, candidate.cohort);
                        candidate.overlap = OverlapTag::NonTrivial;
                    }
                }
            }

            kept.push(candidate);
        }

        debug!(
            "Device {}: kept {} pings after timeline pruning",
            device_id,
            kept.len()
        );
        kept_rows.extend(kept);
    }

    kept_rows
}
