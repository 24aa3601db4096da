//! Tests for session reconciliation

pub mod dedup_tests;

use super::{InfoRow, SessionReconciler};
use crate::app::models::{NormalizedRecord, PingIdentity};
use crate::config::ReconcilerConfig;
use crate::constants::fields;

/// Build an info row with a representative device-field set
pub fn make_row(device_id: &str, start: i64, stop: i64, submission_date: &str) -> InfoRow {
    make_row_with_os(device_id, start, stop, submission_date, "2.0")
}

/// Build an info row with a specific OS value, for conflict tests
pub fn make_row_with_os(
    device_id: &str,
    start: i64,
    stop: i64,
    submission_date: &str,
    os: &str,
) -> InfoRow {
    let mut record = NormalizedRecord::new();
    record.insert(fields::OS, os);
    record.insert(fields::COUNTRY, "Brazil");
    record.insert(fields::PRODUCT_MODEL, "Flame");
    if !submission_date.is_empty() {
        record.insert(fields::SUBMISSION_DATE, submission_date);
    }

    InfoRow {
        identity: PingIdentity::new(device_id, start, stop),
        submission_date: submission_date.to_string(),
        record,
    }
}

/// Reconciler with the default configuration (5 s tolerance,
/// earliest-submission policy, `dogfood`/`foxfood` ID prefixes)
pub fn reconciler() -> SessionReconciler {
    SessionReconciler::new(&ReconcilerConfig::default()).unwrap()
}
