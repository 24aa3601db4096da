//! Country resolution and normalization
//!
//! Country arrives as a 2-letter geo code during shaping, but the same
//! normalizer also runs post-aggregation where the value is already a
//! resolved name. Resolution therefore checks the name set before the code
//! table, which makes it idempotent on already-resolved values.

use crate::app::services::reference_data::ReferenceData;
use crate::constants::{OTHER, UNKNOWN};

/// Resolve a geo code to a country name, or `None` if unrecognized.
///
/// Map-stage helper: an unrecognized code keeps its raw value in the record
/// so it can be inspected later; classification happens at summarize time.
pub fn resolve_country_code<'a>(code: &str, tables: &'a ReferenceData) -> Option<&'a str> {
    tables.lookup_country(code)
}

/// Normalize a raw country value.
///
/// Accepts either a geo code or an already-resolved name. Missing or
/// unrecognizable values are "Unknown"; recognized countries outside the
/// launch-country whitelist are "Other".
pub fn normalize_country(raw: Option<&str>, tables: &ReferenceData) -> String {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => return UNKNOWN.to_string(),
    };

    // Already-classified values pass through unchanged.
    if raw == UNKNOWN || raw == OTHER {
        return raw.to_string();
    }

    // Already a resolved name? Keeps the normalizer idempotent.
    let name = if tables.is_country_name(raw) {
        raw.to_string()
    } else {
        match resolve_country_code(raw, tables) {
            Some(name) => name.to_string(),
            None => return UNKNOWN.to_string(),
        }
    };

    if tables.is_whitelisted_country(&name) {
        name
    } else {
        OTHER.to_string()
    }
}

/// Summarize an already-resolved country value for the dashboard.
///
/// The value is a name if the code resolved during shaping, or the raw geo
/// code if it did not; codes and unknown names both summarize as "Unknown".
pub fn summarize_country(value: &str, tables: &ReferenceData) -> String {
    if value.is_empty() {
        return UNKNOWN.to_string();
    }

    if value == UNKNOWN || value == OTHER {
        return value.to_string();
    }

    if !tables.is_country_name(value) {
        return UNKNOWN.to_string();
    }

    if tables.is_whitelisted_country(value) {
        value.to_string()
    } else {
        OTHER.to_string()
    }
}
