//! Tests for OS version normalization

use crate::app::models::RejectReason;
use crate::app::services::normalizer::os::{canonicalize_os, normalize_os, summarize_os};
use crate::config::NormalizerConfig;
use regex::Regex;

fn valid_os() -> Regex {
    NormalizerConfig::default().valid_os_regex().unwrap()
}

#[test]
fn test_missing_os_is_rejected() {
    assert_eq!(
        normalize_os(None, &valid_os()),
        Err(RejectReason::MissingField("os version"))
    );
}

#[test]
fn test_trailing_zero_components_truncated() {
    assert_eq!(normalize_os(Some("2.5.0.0"), &valid_os()), Ok("2.5".to_string()));
    assert_eq!(normalize_os(Some("1.4.0"), &valid_os()), Ok("1.4".to_string()));
    assert_eq!(normalize_os(Some("2.0.0.0"), &valid_os()), Ok("2.0".to_string()));
}

#[test]
fn test_canonical_values_unchanged() {
    for os in ["1.3", "1.3T", "1.4", "2.0", "3.0"] {
        assert_eq!(normalize_os(Some(os), &valid_os()), Ok(os.to_string()));
    }
}

#[test]
fn test_prerelease_suffix_rewritten() {
    assert_eq!(
        normalize_os(Some("2.5.0.0-prerelease"), &valid_os()),
        Ok("2.5 (pre-release)".to_string())
    );
    assert_eq!(
        normalize_os(Some("3.0.prerelease"), &valid_os()),
        Ok("3.0 (pre-release)".to_string())
    );
}

#[test]
fn test_vendor_prefix_maps_to_tarako_label() {
    assert_eq!(
        normalize_os(Some("ind_flare_v1"), &valid_os()),
        Ok("1.3T".to_string())
    );
    assert_eq!(
        normalize_os(Some("Intex_v12"), &valid_os()),
        Ok("1.3T".to_string())
    );
}

#[test]
fn test_unrecognized_classifies_as_other() {
    assert_eq!(normalize_os(Some("4.2"), &valid_os()), Ok("Other".to_string()));
    assert_eq!(
        normalize_os(Some("Boot2Gecko"), &valid_os()),
        Ok("Other".to_string())
    );
    // Three significant components survive truncation but fail validation.
    assert_eq!(
        normalize_os(Some("2.5.1"), &valid_os()),
        Ok("Other".to_string())
    );
}

#[test]
fn test_canonicalize_without_validation() {
    // Truncation leaves significant components intact.
    assert_eq!(canonicalize_os("1.3.1.0"), "1.3.1");
    assert_eq!(canonicalize_os("2.5.0.0"), "2.5");
}

#[test]
fn test_summarize_matches_normalize_validation() {
    let re = valid_os();
    assert_eq!(summarize_os("1.3T", &re), "1.3T");
    assert_eq!(summarize_os("2.5 (pre-release)", &re), "2.5 (pre-release)");
    assert_eq!(summarize_os("1.5", &re), "Other");
    assert_eq!(summarize_os("", &re), "Other");
}

#[test]
fn test_normalization_is_idempotent() {
    let re = valid_os();
    for raw in ["2.5.0.0", "1.3.0", "ind_tarako", "2.1-prerelease"] {
        let once = normalize_os(Some(raw), &re).unwrap();
        let twice = normalize_os(Some(&once), &re).unwrap();
        assert_eq!(once, twice, "normalizing '{}' twice diverged", raw);
    }
}
