//! Reference data service for O(1) category lookups
//!
//! This module wraps the static reference tables (country codes, mobile
//! network codes, language codes, and the dashboard whitelists) behind typed
//! query functions. The tables are loaded once at startup into an immutable
//! [`ReferenceData`] value that is shared by reference across all workers,
//! so per-record normalization needs no locking and tests can inject small
//! fixture tables directly.

use std::collections::{HashMap, HashSet};

pub mod loader;

pub use loader::load_from_dir;

/// Mobile-code entry: the country a mobile country code belongs to, and the
/// operators registered under it keyed by network code
#[derive(Debug, Clone, serde::Deserialize)]
pub struct MobileCountry {
    /// Country name for this mobile country code
    pub country: String,

    /// Operator names keyed by mobile network code
    #[serde(default)]
    pub operators: HashMap<String, String>,
}

/// Immutable reference tables for field normalization
///
/// Missing keys resolve to `None`/`false`, never an error: an unrecognized
/// code is an expected data condition, not a failure.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    /// 2-letter geo code to country name
    pub(crate) country_codes: HashMap<String, String>,

    /// Set of all country names appearing in the code table
    pub(crate) country_names: HashSet<String>,

    /// Mobile country code to country and operator table
    pub(crate) mobile_codes: HashMap<String, MobileCountry>,

    /// Base locale code to language name
    pub(crate) languages: HashMap<String, String>,

    /// Launch countries retained as distinct dashboard values
    pub(crate) country_whitelist: HashSet<String>,

    /// Recognized device-name prefixes retained as distinct values
    pub(crate) device_prefixes: Vec<String>,

    /// Recognized operators retained as distinct dashboard values
    pub(crate) operator_whitelist: HashSet<String>,
}

impl ReferenceData {
    /// Create an empty table set (everything resolves to None/false)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble reference data from already-loaded tables.
    ///
    /// The country-name set is derived from the code table here so the two
    /// can never disagree.
    pub fn from_tables(
        country_codes: HashMap<String, String>,
        mobile_codes: HashMap<String, MobileCountry>,
        languages: HashMap<String, String>,
        country_whitelist: HashSet<String>,
        device_prefixes: Vec<String>,
        operator_whitelist: HashSet<String>,
    ) -> Self {
        let country_names = country_codes.values().cloned().collect();
        Self {
            country_codes,
            country_names,
            mobile_codes,
            languages,
            country_whitelist,
            device_prefixes,
            operator_whitelist,
        }
    }

    /// Look up a country name from its 2-letter geo code
    pub fn lookup_country(&self, code: &str) -> Option<&str> {
        self.country_codes.get(code.trim()).map(String::as_str)
    }

    /// Check whether a value is a known country name (already resolved)
    pub fn is_country_name(&self, name: &str) -> bool {
        self.country_names.contains(name)
    }

    /// Look up the country a mobile country code belongs to
    pub fn lookup_mobile_country(&self, mcc: &str) -> Option<&str> {
        let mcc = strip_leading_zeros(mcc);
        self.mobile_codes.get(&mcc).map(|m| m.country.as_str())
    }

    /// Look up an operator name from its (mcc, mnc) code pair.
    ///
    /// Network codes are only meaningful within their country code, so both
    /// are required.
    pub fn lookup_mobile_network(&self, mcc: &str, mnc: &str) -> Option<&str> {
        let mcc = strip_leading_zeros(mcc);
        let mnc = strip_leading_zeros(mnc);
        self.mobile_codes
            .get(&mcc)
            .and_then(|m| m.operators.get(&mnc))
            .map(String::as_str)
    }

    /// Look up a language name from a base locale code
    pub fn lookup_language(&self, base_locale: &str) -> Option<&str> {
        self.languages.get(base_locale.trim()).map(String::as_str)
    }

    /// Check a country name against the launch-country whitelist
    pub fn is_whitelisted_country(&self, name: &str) -> bool {
        self.country_whitelist.contains(name)
    }

    /// Check an operator name against the operator whitelist
    pub fn is_whitelisted_operator(&self, name: &str) -> bool {
        self.operator_whitelist.contains(name)
    }

    /// Check whether a device name starts with a recognized prefix
    pub fn has_device_prefix(&self, name: &str) -> bool {
        self.device_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Table sizes for startup logging
    pub fn table_counts(&self) -> TableCounts {
        TableCounts {
            country_codes: self.country_codes.len(),
            mobile_countries: self.mobile_codes.len(),
            languages: self.languages.len(),
            whitelisted_countries: self.country_whitelist.len(),
            device_prefixes: self.device_prefixes.len(),
            whitelisted_operators: self.operator_whitelist.len(),
        }
    }
}

/// Sizes of the loaded reference tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub country_codes: usize,
    pub mobile_countries: usize,
    pub languages: usize,
    pub whitelisted_countries: usize,
    pub device_prefixes: usize,
    pub whitelisted_operators: usize,
}

/// Remove leading zeros from a string of digits.
///
/// A string of all zeros normalizes to `"0"`, not the empty string, so a
/// genuine zero code stays distinguishable from a missing one.
pub fn strip_leading_zeros(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    let stripped = value.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small fixture table set used across the reference data tests
    pub(crate) fn fixture_tables() -> ReferenceData {
        let country_codes = HashMap::from([
            ("BR".to_string(), "Brazil".to_string()),
            ("IN".to_string(), "India".to_string()),
            ("DE".to_string(), "Germany".to_string()),
        ]);
        let mobile_codes = HashMap::from([(
            "724".to_string(),
            MobileCountry {
                country: "Brazil".to_string(),
                operators: HashMap::from([
                    ("5".to_string(), "Claro".to_string()),
                    ("6".to_string(), "Vivo".to_string()),
                ]),
            },
        )]);
        let languages = HashMap::from([
            ("pt".to_string(), "Portuguese".to_string()),
            ("en".to_string(), "English".to_string()),
        ]);
        let country_whitelist = HashSet::from(["Brazil".to_string(), "India".to_string()]);
        let device_prefixes = vec!["One Touch Fire".to_string(), "ZTE Open".to_string()];
        let operator_whitelist = HashSet::from(["Claro".to_string(), "Vivo".to_string()]);

        ReferenceData::from_tables(
            country_codes,
            mobile_codes,
            languages,
            country_whitelist,
            device_prefixes,
            operator_whitelist,
        )
    }

    #[test]
    fn test_strip_leading_zeros() {
        assert_eq!(strip_leading_zeros("0724"), "724");
        assert_eq!(strip_leading_zeros("724"), "724");
        assert_eq!(strip_leading_zeros("000"), "0");
        assert_eq!(strip_leading_zeros("0"), "0");
        assert_eq!(strip_leading_zeros(""), "");
        assert_eq!(strip_leading_zeros("  05 "), "5");
    }

    #[test]
    fn test_country_lookup() {
        let tables = fixture_tables();
        assert_eq!(tables.lookup_country("BR"), Some("Brazil"));
        assert_eq!(tables.lookup_country(" BR "), Some("Brazil"));
        assert_eq!(tables.lookup_country("XX"), None);
    }

    #[test]
    fn test_country_names_derived_from_codes() {
        let tables = fixture_tables();
        assert!(tables.is_country_name("Brazil"));
        assert!(tables.is_country_name("Germany"));
        assert!(!tables.is_country_name("Atlantis"));
    }

    #[test]
    fn test_mobile_lookups_strip_zeros() {
        let tables = fixture_tables();
        assert_eq!(tables.lookup_mobile_country("724"), Some("Brazil"));
        assert_eq!(tables.lookup_mobile_country("0724"), Some("Brazil"));
        assert_eq!(tables.lookup_mobile_network("724", "05"), Some("Claro"));
        assert_eq!(tables.lookup_mobile_network("0724", "6"), Some("Vivo"));
        assert_eq!(tables.lookup_mobile_network("724", "99"), None);
        assert_eq!(tables.lookup_mobile_network("310", "5"), None);
    }

    #[test]
    fn test_language_lookup() {
        let tables = fixture_tables();
        assert_eq!(tables.lookup_language("pt"), Some("Portuguese"));
        assert_eq!(tables.lookup_language("fr"), None);
    }

    #[test]
    fn test_whitelists() {
        let tables = fixture_tables();
        assert!(tables.is_whitelisted_country("Brazil"));
        assert!(!tables.is_whitelisted_country("Germany"));
        assert!(tables.is_whitelisted_operator("Claro"));
        assert!(!tables.is_whitelisted_operator("Orange"));
    }

    #[test]
    fn test_device_prefixes() {
        let tables = fixture_tables();
        assert!(tables.has_device_prefix("One Touch Fire C"));
        assert!(tables.has_device_prefix("ZTE Open 2"));
        assert!(!tables.has_device_prefix("Flame"));
    }

    #[test]
    fn test_empty_tables_resolve_to_nothing() {
        let tables = ReferenceData::empty();
        assert_eq!(tables.lookup_country("BR"), None);
        assert_eq!(tables.lookup_mobile_network("724", "5"), None);
        assert!(!tables.is_whitelisted_country("Brazil"));
        assert!(!tables.has_device_prefix("Flame"));
    }

    #[test]
    fn test_table_counts() {
        let counts = fixture_tables().table_counts();
        assert_eq!(counts.country_codes, 3);
        assert_eq!(counts.mobile_countries, 1);
        assert_eq!(counts.whitelisted_operators, 2);
    }
}
