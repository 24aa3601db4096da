//! Reference table loading from JSON files
//!
//! Tables live as JSON files in a lookup directory supplied at startup:
//!
//! - `countrycodes.json`: `{ "<code>": {"name": "<country>"}, ... }`
//! - `mobile-codes.json`: `{ "<mcc>": {"country": ..., "operators": {"<mnc>": ...}}, ... }`
//! - `language-codes.json`: `{ "<base locale>": "<language>", ... }`
//! - `ftu-fields.json`: `{ "country": [...], "device": [...], "operator": [...] }`
//!
//! Loading happens once at startup; the resulting [`ReferenceData`] is
//! immutable for the lifetime of the run.

use super::{MobileCountry, ReferenceData};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Country-code table filename
pub const COUNTRY_CODES_FILENAME: &str = "countrycodes.json";

/// Mobile-code table filename
pub const MOBILE_CODES_FILENAME: &str = "mobile-codes.json";

/// Language-code table filename
pub const LANGUAGE_CODES_FILENAME: &str = "language-codes.json";

/// Whitelist table filename
pub const WHITELISTS_FILENAME: &str = "ftu-fields.json";

/// Country-code table entry as stored on disk
#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
}

/// Whitelist file shape as stored on disk
#[derive(Debug, Deserialize)]
struct WhitelistFile {
    #[serde(default)]
    country: Vec<String>,
    #[serde(default)]
    device: Vec<String>,
    #[serde(default)]
    operator: Vec<String>,
}

/// Load all reference tables from a lookup directory
pub fn load_from_dir(lookup_dir: &Path) -> Result<ReferenceData> {
    if !lookup_dir.is_dir() {
        return Err(Error::file_not_found(lookup_dir.display().to_string()));
    }

    let country_entries: HashMap<String, CountryEntry> =
        load_json_file(&lookup_dir.join(COUNTRY_CODES_FILENAME))?;
    let country_codes = country_entries
        .into_iter()
        .map(|(code, entry)| (code, entry.name))
        .collect();

    let mobile_codes: HashMap<String, MobileCountry> =
        load_json_file(&lookup_dir.join(MOBILE_CODES_FILENAME))?;

    let languages: HashMap<String, String> =
        load_json_file(&lookup_dir.join(LANGUAGE_CODES_FILENAME))?;

    let whitelists: WhitelistFile = load_json_file(&lookup_dir.join(WHITELISTS_FILENAME))?;
    let country_whitelist: HashSet<String> = whitelists.country.into_iter().collect();
    let operator_whitelist: HashSet<String> = whitelists.operator.into_iter().collect();

    let tables = ReferenceData::from_tables(
        country_codes,
        mobile_codes,
        languages,
        country_whitelist,
        whitelists.device,
        operator_whitelist,
    );

    let counts = tables.table_counts();
    info!(
        "Loaded reference tables from {}: {} country codes, {} mobile countries, \
         {} languages, {} whitelisted countries, {} device prefixes, {} whitelisted operators",
        lookup_dir.display(),
        counts.country_codes,
        counts.mobile_countries,
        counts.languages,
        counts.whitelisted_countries,
        counts.device_prefixes,
        counts.whitelisted_operators
    );

    Ok(tables)
}

/// Read and deserialize one JSON table file
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

    serde_json::from_str(&contents).map_err(|e| {
        Error::json(
            path.display().to_string(),
            "Reference table has unexpected shape",
            Some(e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture_tables(dir: &Path) {
        fs::write(
            dir.join(COUNTRY_CODES_FILENAME),
            r#"{"BR": {"name": "Brazil"}, "PE": {"name": "Peru"}}"#,
        )
        .unwrap();
        fs::write(
            dir.join(MOBILE_CODES_FILENAME),
            r#"{"724": {"country": "Brazil", "operators": {"5": "Claro"}}}"#,
        )
        .unwrap();
        fs::write(
            dir.join(LANGUAGE_CODES_FILENAME),
            r#"{"pt": "Portuguese"}"#,
        )
        .unwrap();
        fs::write(
            dir.join(WHITELISTS_FILENAME),
            r#"{"country": ["Brazil"], "device": ["One Touch Fire"], "operator": ["Claro"]}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        write_fixture_tables(dir.path());

        let tables = load_from_dir(dir.path()).unwrap();
        assert_eq!(tables.lookup_country("PE"), Some("Peru"));
        assert_eq!(tables.lookup_mobile_network("724", "5"), Some("Claro"));
        assert_eq!(tables.lookup_language("pt"), Some("Portuguese"));
        assert!(tables.is_whitelisted_country("Brazil"));
        assert!(tables.has_device_prefix("One Touch Fire C"));
        assert!(tables.is_whitelisted_operator("Claro"));
    }

    #[test]
    fn test_missing_directory() {
        let result = load_from_dir(Path::new("/nonexistent/lookup"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_missing_table_file() {
        let dir = TempDir::new().unwrap();
        // Only one of the four tables present.
        fs::write(
            dir.path().join(COUNTRY_CODES_FILENAME),
            r#"{"BR": {"name": "Brazil"}}"#,
        )
        .unwrap();

        assert!(load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_malformed_table_file() {
        let dir = TempDir::new().unwrap();
        write_fixture_tables(dir.path());
        fs::write(dir.path().join(MOBILE_CODES_FILENAME), "{not json").unwrap();

        let result = load_from_dir(dir.path());
        assert!(matches!(result, Err(Error::Json { .. })));
    }
}
