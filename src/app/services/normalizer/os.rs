//! OS version normalization
//!
//! OS strings in the wild range from clean versions ("1.3") to padded
//! build identifiers ("2.0.0.0-prerelease") to vendor-prefixed Tarako
//! builds with no version at all. The substitution rules reduce them to a
//! short displayable form; anything that still does not match the accepted
//! shape classifies as "Other" so the record keeps counting without
//! polluting the category space.

use super::rules::{OS_SUBS, apply_all};
use crate::app::models::RejectReason;
use crate::constants::OTHER;
use regex::Regex;

/// Apply the OS substitution rules without validating the result
pub fn canonicalize_os(raw: &str) -> String {
    apply_all(raw, &OS_SUBS)
}

/// Normalize a raw OS version string.
///
/// A missing value is a hard reject (an FTU record without an OS version is
/// unusable); an unrecognized value is a soft "Other" classification.
///
/// # Arguments
///
/// * `raw` - Raw OS string from the payload, if present
/// * `valid_os` - Accepted shape for normalized versions (configured)
pub fn normalize_os(
    raw: Option<&str>,
    valid_os: &Regex,
) -> std::result::Result<String, RejectReason> {
    let raw = raw.ok_or(RejectReason::MissingField("os version"))?;

    let os = canonicalize_os(raw);

    if valid_os.is_match(&os) {
        Ok(os)
    } else {
        Ok(OTHER.to_string())
    }
}

/// Summarize an already-normalized OS value for the dashboard.
///
/// Identical validation to [`normalize_os`], applied post-aggregation where
/// the value has been through the map stage already.
pub fn summarize_os(value: &str, valid_os: &Regex) -> String {
    if valid_os.is_match(value) {
        value.to_string()
    } else {
        OTHER.to_string()
    }
}
