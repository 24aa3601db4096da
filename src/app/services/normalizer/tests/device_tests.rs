//! Tests for device name normalization

use super::test_tables;
use crate::app::services::normalizer::device::{
    canonicalize_device, normalize_device, summarize_device,
};

#[test]
fn test_missing_device_is_unknown() {
    let tables = test_tables();
    assert_eq!(normalize_device(None, &tables), "Unknown");
}

#[test]
fn test_one_touch_fire_variants() {
    let tables = test_tables();
    for raw in [
        "ALCATEL ONE TOUCH FIRE C",
        "one touch fire c",
        "Alcatel OneTouch Fire C 4020",
        "ONETOUCH Fire C",
    ] {
        assert_eq!(
            normalize_device(Some(raw), &tables),
            "One Touch Fire C",
            "variant '{}' did not canonicalize",
            raw
        );
    }
}

#[test]
fn test_fire_suffix_casing() {
    let tables = test_tables();
    assert_eq!(normalize_device(Some("one touch fire e"), &tables), "One Touch Fire E");
    assert_eq!(normalize_device(Some("One Touch Fire"), &tables), "One Touch Fire");
}

#[test]
fn test_peru_model_number_alias() {
    let tables = test_tables();
    assert_eq!(normalize_device(Some("4019A"), &tables), "One Touch Fire C");
}

#[test]
fn test_zte_open_variants() {
    let tables = test_tables();
    assert_eq!(normalize_device(Some("ZTE OPEN"), &tables), "ZTE Open");
    assert_eq!(normalize_device(Some("zte open c"), &tables), "ZTE Open C");
    assert_eq!(normalize_device(Some("Open 2"), &tables), "ZTE Open 2");
}

#[test]
fn test_unrecognized_prefix_is_other() {
    let tables = test_tables();
    // Canonicalizes to "Geeksphone", which is not a recognized prefix here.
    assert_eq!(normalize_device(Some("Geeksphone Keon"), &tables), "Other");
    // No rule matches and no prefix matches.
    assert_eq!(normalize_device(Some("Acme Phone 9"), &tables), "Other");
}

#[test]
fn test_unmatched_string_passes_through_canonicalization() {
    assert_eq!(canonicalize_device("Acme Phone 9"), "Acme Phone 9");
}

#[test]
fn test_normalization_is_idempotent() {
    let tables = test_tables();
    for raw in ["ALCATEL ONE TOUCH FIRE C", "flame v2", "ZTE OPEN"] {
        let once = normalize_device(Some(raw), &tables);
        let twice = normalize_device(Some(&once), &tables);
        assert_eq!(once, twice, "normalizing '{}' twice diverged", raw);
    }
}

#[test]
fn test_summarize_device_sentinels() {
    let tables = test_tables();
    // Empty marks a device name absent from the original record.
    assert_eq!(summarize_device("", &tables), "Unknown");
    assert_eq!(summarize_device("One Touch Fire C", &tables), "One Touch Fire C");
    assert_eq!(summarize_device("Some Device", &tables), "Other");
}
