//! Record shaping for raw telemetry payloads
//!
//! This module turns one raw nested payload into a canonical flat record,
//! or a rejection with a named condition. Shaping is fail-soft: every
//! per-record problem is classified and counted, and nothing here ever
//! aborts a batch.
//!
//! The pipeline per record:
//! 1. consistency check of the identity marker fields (hard reject)
//! 2. flattening with fixed rename rules (hard reject on residual nesting)
//! 3. timestamp conversion, with range validation for the ping date
//! 4. update-channel reconciliation (kept, disagreement counted)
//! 5. field normalizers (OS, device, operator, country, locale)
//! 6. record-level hooks, last, so they see final categorized values
//!
//! Shaping is pure per record given the shared read-only reference tables,
//! so the caller may shape arbitrarily many records concurrently.

use crate::app::models::{NormalizedRecord, RejectReason};
use crate::app::services::reference_data::ReferenceData;
use crate::config::NormalizerConfig;
use crate::constants::{
    EXPECTED_APP_NAME, ISO_DATE_FORMAT, SUBMISSION_DATE_FORMAT, conditions, fields,
};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod appusage;
pub mod flatten;
pub mod ftu;

pub use appusage::{AppUsageRow, SearchRow, ShapedUsage};
pub use flatten::flatten_payload;

/// A successfully shaped record plus any non-fatal diagnostics to count
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRecord {
    /// The canonical flat record
    pub record: NormalizedRecord,

    /// Conditions observed while shaping that do not reject the record
    /// (e.g. disagreeing update-channel fields)
    pub diagnostics: Vec<String>,
}

/// Shaper for raw telemetry payloads
///
/// Holds the shared reference tables and the compiled validation state for
/// one run. The accepted ping-date range is fixed at construction so every
/// record in a batch is judged against the same window.
#[derive(Debug, Clone)]
pub struct PayloadShaper {
    tables: Arc<ReferenceData>,
    valid_os: Regex,
    earliest_ping_date: NaiveDate,
    latest_ping_date: NaiveDate,
}

impl PayloadShaper {
    /// Create a shaper from reference tables and normalizer configuration
    pub fn new(tables: Arc<ReferenceData>, config: &NormalizerConfig) -> crate::Result<Self> {
        Ok(Self {
            tables,
            valid_os: config.valid_os_regex()?,
            earliest_ping_date: config.earliest_date()?,
            latest_ping_date: config.latest_date(),
        })
    }

    /// The reference tables used by this shaper
    pub fn tables(&self) -> &ReferenceData {
        &self.tables
    }

    /// The compiled valid-OS pattern used by this shaper
    pub fn valid_os(&self) -> &Regex {
        &self.valid_os
    }

    /// Check the payload's identity marker fields.
    ///
    /// The `info` block must carry the expected app name and ping reason,
    /// and the fields it duplicates from the `deviceinfo.` namespace must
    /// agree with their top-level counterparts.
    pub(crate) fn consistent_info(payload: &Map<String, Value>, expected_reason: &str) -> bool {
        let info = match payload.get("info").and_then(Value::as_object) {
            Some(info) => info,
            None => return false,
        };

        info.get("appName").and_then(Value::as_str) == Some(EXPECTED_APP_NAME)
            && info.get("reason").and_then(Value::as_str) == Some(expected_reason)
            && (!payload.contains_key("deviceinfo.update_channel")
                || info.get("appUpdateChannel") == payload.get("deviceinfo.update_channel"))
            && info.get("appVersion") == payload.get("deviceinfo.platform_version")
            && info.get("appBuildID") == payload.get("deviceinfo.platform_build_id")
    }

    /// Keep only the geo code from the `info` block, then drop the block.
    /// Everything else in `info` duplicates fields checked for consistency.
    pub(crate) fn extract_geo_country(payload: &mut Map<String, Value>) {
        let geo = payload
            .get("info")
            .and_then(Value::as_object)
            .and_then(|info| info.get("geoCountry"))
            .cloned();
        if let Some(geo) = geo {
            payload.insert(fields::COUNTRY.to_string(), geo);
        }
        payload.remove("info");
    }

    /// Convert a millisecond epoch value to a calendar date.
    ///
    /// Accepts a JSON number or a numeric string; anything else is an
    /// invalid-format outcome named after the field being converted.
    pub(crate) fn ms_timestamp_to_date(
        value: &Value,
        what: &'static str,
    ) -> std::result::Result<NaiveDate, RejectReason> {
        let millis = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or(RejectReason::InvalidFormat(what))?;

        DateTime::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .ok_or(RejectReason::InvalidFormat(what))
    }

    /// Convert and range-check the ping time.
    ///
    /// Dates before the configured earliest date or after yesterday mean a
    /// wrong device clock; the record is rejected rather than counted under
    /// a date it never happened on.
    pub(crate) fn ping_date(
        &self,
        value: Option<&Value>,
    ) -> std::result::Result<NaiveDate, RejectReason> {
        let value = value.ok_or(RejectReason::MissingField("ping time"))?;
        let date = Self::ms_timestamp_to_date(value, "ping time")?;

        if date < self.earliest_ping_date || date > self.latest_ping_date {
            return Err(RejectReason::OutOfRange);
        }
        Ok(date)
    }

    /// Reconcile the two update-channel fields.
    ///
    /// `update_channel` is the preferred source. When both are present and
    /// disagree, the preferred value is kept and the disagreement is
    /// returned as a diagnostic condition recording both values.
    pub(crate) fn merge_update_channels(flat: &mut BTreeMap<String, Value>) -> Option<String> {
        let app_channel = flat.remove(fields::APP_UPDATE_CHANNEL)?;

        match flat.get(fields::UPDATE_CHANNEL) {
            Some(channel) if *channel != app_channel => Some(format!(
                "{}: {} = {}, {} = {}",
                conditions::MULTIPLE_CHANNELS_PREFIX,
                fields::UPDATE_CHANNEL,
                value_to_string(channel),
                fields::APP_UPDATE_CHANNEL,
                value_to_string(&app_channel),
            )),
            Some(_) => None,
            None => {
                // Only the app-reported channel is present; adopt it.
                flat.insert(fields::UPDATE_CHANNEL.to_string(), app_channel);
                None
            }
        }
    }

    /// Convert a `yyyymmdd` submission date to ISO form.
    /// Malformed dates are treated as missing, not as an error.
    pub(crate) fn submission_date_iso(raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        NaiveDate::parse_from_str(raw, SUBMISSION_DATE_FORMAT)
            .ok()
            .map(|date| date.format(ISO_DATE_FORMAT).to_string())
    }

    /// Move every remaining flat scalar into the record.
    ///
    /// Arrays render as their JSON text so no payload data is silently
    /// dropped; objects cannot occur here (flattening rejected them).
    pub(crate) fn record_from_flat(flat: BTreeMap<String, Value>) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        for (key, value) in flat {
            match crate::app::models::FieldValue::from_json(&value) {
                Some(field_value) => record.insert(key, field_value),
                None => record.insert(key, value.to_string()),
            }
        }
        record
    }
}

/// Render a JSON scalar for a diagnostic message (strings unquoted)
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a flat field as a trimmed, non-empty string, accepting numbers
pub(crate) fn flat_str(flat: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    let value = flat.get(key)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn consistent_payload(reason: &str) -> Map<String, Value> {
        object(json!({
            "info": {
                "appName": "FirefoxOS",
                "reason": reason,
                "appUpdateChannel": "release",
                "appVersion": "2.0",
                "appBuildID": "20150101",
                "geoCountry": "BR",
            },
            "deviceinfo.update_channel": "release",
            "deviceinfo.platform_version": "2.0",
            "deviceinfo.platform_build_id": "20150101",
        }))
    }

    #[test]
    fn test_consistent_info_accepts_matching_payload() {
        let payload = consistent_payload("ftu");
        assert!(PayloadShaper::consistent_info(&payload, "ftu"));
    }

    #[test]
    fn test_consistent_info_rejects_wrong_reason() {
        let payload = consistent_payload("appusage");
        assert!(!PayloadShaper::consistent_info(&payload, "ftu"));
    }

    #[test]
    fn test_consistent_info_rejects_disagreeing_duplicate() {
        let mut payload = consistent_payload("ftu");
        payload.insert(
            "deviceinfo.platform_version".to_string(),
            json!("2.1"),
        );
        assert!(!PayloadShaper::consistent_info(&payload, "ftu"));
    }

    #[test]
    fn test_consistent_info_requires_info_block() {
        let payload = object(json!({"deviceinfo.os": "2.0"}));
        assert!(!PayloadShaper::consistent_info(&payload, "ftu"));
    }

    #[test]
    fn test_channel_consistency_skipped_when_top_level_absent() {
        let mut payload = consistent_payload("ftu");
        payload.remove("deviceinfo.update_channel");
        assert!(PayloadShaper::consistent_info(&payload, "ftu"));
    }

    #[test]
    fn test_extract_geo_country() {
        let mut payload = consistent_payload("ftu");
        PayloadShaper::extract_geo_country(&mut payload);
        assert_eq!(payload.get("country"), Some(&json!("BR")));
        assert!(!payload.contains_key("info"));
    }

    #[test]
    fn test_ms_timestamp_conversion() {
        // 2014-05-13T16:53:20Z
        let date = PayloadShaper::ms_timestamp_to_date(&json!(1400000000000i64), "ping time");
        assert_eq!(date.unwrap().to_string(), "2014-05-13");

        // Numeric strings are accepted.
        let date = PayloadShaper::ms_timestamp_to_date(&json!("1400000000000"), "ping time");
        assert_eq!(date.unwrap().to_string(), "2014-05-13");

        let err = PayloadShaper::ms_timestamp_to_date(&json!("soon"), "ping time");
        assert_eq!(err, Err(RejectReason::InvalidFormat("ping time")));
    }

    #[test]
    fn test_merge_update_channels_prefers_update_channel() {
        let mut flat = BTreeMap::from([
            ("update_channel".to_string(), json!("release")),
            ("app.update.channel".to_string(), json!("beta")),
        ]);
        let diagnostic = PayloadShaper::merge_update_channels(&mut flat).unwrap();
        assert!(diagnostic.starts_with("multiple channels"));
        assert!(diagnostic.contains("release"));
        assert!(diagnostic.contains("beta"));
        // Preferred value kept, secondary field dropped.
        assert_eq!(flat.get("update_channel"), Some(&json!("release")));
        assert!(!flat.contains_key("app.update.channel"));
    }

    #[test]
    fn test_merge_update_channels_adopts_secondary_when_alone() {
        let mut flat = BTreeMap::from([("app.update.channel".to_string(), json!("nightly"))]);
        assert_eq!(PayloadShaper::merge_update_channels(&mut flat), None);
        assert_eq!(flat.get("update_channel"), Some(&json!("nightly")));
    }

    #[test]
    fn test_merge_update_channels_silent_on_agreement() {
        let mut flat = BTreeMap::from([
            ("update_channel".to_string(), json!("release")),
            ("app.update.channel".to_string(), json!("release")),
        ]);
        assert_eq!(PayloadShaper::merge_update_channels(&mut flat), None);
        assert_eq!(flat.get("update_channel"), Some(&json!("release")));
    }

    #[test]
    fn test_submission_date_iso() {
        assert_eq!(
            PayloadShaper::submission_date_iso(Some("20150312")),
            Some("2015-03-12".to_string())
        );
        assert_eq!(PayloadShaper::submission_date_iso(Some("2015031")), None);
        assert_eq!(PayloadShaper::submission_date_iso(None), None);
    }

    #[test]
    fn test_flat_str_accepts_numbers() {
        let flat = BTreeMap::from([
            ("mcc".to_string(), json!(724)),
            ("spn".to_string(), json!("  Claro ")),
            ("empty".to_string(), json!("   ")),
        ]);
        assert_eq!(flat_str(&flat, "mcc"), Some("724".to_string()));
        assert_eq!(flat_str(&flat, "spn"), Some("Claro".to_string()));
        assert_eq!(flat_str(&flat, "empty"), None);
        assert_eq!(flat_str(&flat, "missing"), None);
    }
}
