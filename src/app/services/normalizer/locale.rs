//! Locale and update-channel normalization

use super::rules::{LOCALE_BASE_CODE, STANDARD_CHANNELS};
use crate::app::services::reference_data::ReferenceData;

/// Strip the country identifier from a locale code (`pt-BR` -> `pt`)
pub fn base_locale(locale: &str) -> String {
    LOCALE_BASE_CODE.replace(locale.trim(), "").into_owned()
}

/// Resolve a locale code to a language name.
///
/// The locale is reduced to its base code before the table lookup; the
/// original locale stays on the record for reference.
pub fn lookup_language<'a>(locale: &str, tables: &'a ReferenceData) -> Option<&'a str> {
    tables.lookup_language(&base_locale(locale))
}

/// Map a custom channel string onto one of the standard channels.
///
/// Partners embed the base channel inside custom strings
/// ("release-partnerX"); searching for the standard name separates them
/// cleanly. No standard channel found means "other".
pub fn standardize_channel(channel: &str) -> String {
    match STANDARD_CHANNELS.find(channel) {
        Some(found) => found.as_str().to_string(),
        None => "other".to_string(),
    }
}
