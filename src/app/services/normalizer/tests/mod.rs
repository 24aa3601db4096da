//! Tests for the field normalizers
//!
//! Covers the substitution tables, sentinel semantics, fallback ordering,
//! and idempotence of every normalizer against fixture reference tables.

pub mod device_tests;
pub mod locale_tests;
pub mod os_tests;

use crate::app::services::reference_data::{MobileCountry, ReferenceData};
use std::collections::{HashMap, HashSet};

/// Reference tables shared by the normalizer tests.
///
/// Mirrors the shape of the production lookup files: a handful of launch
/// countries, the recognized device prefixes, and a few operators.
pub fn test_tables() -> ReferenceData {
    let country_codes = HashMap::from([
        ("BR".to_string(), "Brazil".to_string()),
        ("IN".to_string(), "India".to_string()),
        ("PE".to_string(), "Peru".to_string()),
        ("DE".to_string(), "Germany".to_string()),
        ("HU".to_string(), "Hungary".to_string()),
    ]);

    let mobile_codes = HashMap::from([
        (
            "724".to_string(),
            MobileCountry {
                country: "Brazil".to_string(),
                operators: HashMap::from([
                    ("5".to_string(), "Claro".to_string()),
                    ("6".to_string(), "Vivo".to_string()),
                ]),
            },
        ),
        (
            "404".to_string(),
            MobileCountry {
                country: "India".to_string(),
                operators: HashMap::from([("45".to_string(), "Airtel".to_string())]),
            },
        ),
    ]);

    let languages = HashMap::from([
        ("pt".to_string(), "Portuguese".to_string()),
        ("en".to_string(), "English".to_string()),
        ("hu".to_string(), "Hungarian".to_string()),
    ]);

    let country_whitelist = HashSet::from([
        "Brazil".to_string(),
        "India".to_string(),
        "Peru".to_string(),
        "Hungary".to_string(),
    ]);

    let device_prefixes = vec![
        "One Touch Fire".to_string(),
        "ZTE Open".to_string(),
        "Flame".to_string(),
        "Intex Cloud FX".to_string(),
        "Spice MIFX".to_string(),
    ];

    let operator_whitelist = HashSet::from([
        "Claro".to_string(),
        "Vivo".to_string(),
        "Airtel".to_string(),
        "Vodafone".to_string(),
        "T-Mobile".to_string(),
    ]);

    ReferenceData::from_tables(
        country_codes,
        mobile_codes,
        languages,
        country_whitelist,
        device_prefixes,
        operator_whitelist,
    )
}
