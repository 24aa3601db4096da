//! Device name normalization
//!
//! Manufacturers report the same handset with wildly varying punctuation,
//! case, and spacing. A single substitution rule (first match wins)
//! collapses the variants onto one canonical label; names that then fail
//! the recognized-prefix check classify as "Other" so long-tail devices do
//! not each get their own dashboard segment.

use super::rules::{DEVICE_SUBS, apply_first};
use crate::app::services::reference_data::ReferenceData;
use crate::constants::{OTHER, UNKNOWN};

/// Apply the device substitution rules without the whitelist check
pub fn canonicalize_device(raw: &str) -> String {
    apply_first(raw, &DEVICE_SUBS)
}

/// Normalize a raw device-model string.
///
/// Missing values are "Unknown"; canonicalized names that do not start
/// with a recognized prefix are "Other".
pub fn normalize_device(raw: Option<&str>, tables: &ReferenceData) -> String {
    let raw = match raw {
        Some(value) => value,
        None => return UNKNOWN.to_string(),
    };

    // Already-classified values pass through, keeping normalization
    // idempotent across the shaping and summarization stages.
    if raw == UNKNOWN || raw == OTHER {
        return raw.to_string();
    }

    let device = canonicalize_device(raw);

    if tables.has_device_prefix(&device) {
        device
    } else {
        OTHER.to_string()
    }
}

/// Summarize an already-canonicalized device name for the dashboard.
///
/// The empty string marks a device name that was absent in the original
/// record; it summarizes as "Unknown" rather than "Other".
pub fn summarize_device(value: &str, tables: &ReferenceData) -> String {
    if value.is_empty() {
        return UNKNOWN.to_string();
    }
    if value == UNKNOWN || value == OTHER {
        return value.to_string();
    }
    if tables.has_device_prefix(value) {
        value.to_string()
    } else {
        OTHER.to_string()
    }
}
