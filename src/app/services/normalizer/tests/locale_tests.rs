//! Tests for locale and channel normalization

use super::test_tables;
use crate::app::services::normalizer::locale::{base_locale, lookup_language, standardize_channel};

#[test]
fn test_base_locale_strips_country() {
    assert_eq!(base_locale("pt-BR"), "pt");
    assert_eq!(base_locale("en-US"), "en");
    assert_eq!(base_locale("hu"), "hu");
    assert_eq!(base_locale(" en-GB "), "en");
}

#[test]
fn test_language_lookup_uses_base_code() {
    let tables = test_tables();
    assert_eq!(lookup_language("pt-BR", &tables), Some("Portuguese"));
    assert_eq!(lookup_language("pt", &tables), Some("Portuguese"));
    assert_eq!(lookup_language("fr-FR", &tables), None);
}

#[test]
fn test_standard_channel_extraction() {
    assert_eq!(standardize_channel("release"), "release");
    assert_eq!(standardize_channel("release-partner1"), "release");
    assert_eq!(standardize_channel("custom-beta-build"), "beta");
    assert_eq!(standardize_channel("nightly-latest"), "nightly");
    assert_eq!(standardize_channel("unbranded"), "other");
}
