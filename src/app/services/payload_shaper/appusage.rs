//! AU (app-usage) payload shaping
//!
//! An AU payload covers one start-stop measurement window for one device
//! and carries three kinds of data: the device/session info fields, a
//! per-date per-app usage map, and a per-date per-provider search map.
//! Shaping produces one info record keyed by the ping identity plus the
//! exploded app and search rows, all sharing that identity.

use super::{PayloadShaper, flat_str, flatten::flatten_payload, value_to_string};
use crate::app::models::{NormalizedRecord, PingIdentity, RejectReason, SubmissionEnvelope};
use crate::app::services::normalizer::{
    OperatorSource, apply_record_hooks, lookup_language, normalize_country, normalize_device,
    normalize_operator, normalize_os, standardize_channel,
};
use crate::constants::{ISO_DATE_FORMAT, MISSING_PLACEHOLDER, REASON_APPUSAGE, fields};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One per-app usage row exploded from an AU payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUsageRow {
    /// Calendar date the usage was recorded under
    pub usage_date: String,

    /// App identifier (manifest URL)
    pub app_url: String,

    /// Foreground usage in seconds
    pub usage_time_s: i64,

    /// Number of times the app was opened
    pub invocations: i64,

    /// Install events
    pub installs: i64,

    /// Uninstall events
    pub uninstalls: i64,

    /// Activity counts joined as `name:count` pairs
    pub activities: String,
}

/// One per-provider search row exploded from an AU payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRow {
    /// Calendar date the searches were recorded under
    pub search_date: String,

    /// Search provider identifier
    pub provider: String,

    /// Search count
    pub count: i64,
}

/// The complete shaped form of one AU payload
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedUsage {
    /// Ping identity shared by the info row and all derived rows
    pub identity: PingIdentity,

    /// Submission date (ISO), or the empty placeholder when absent
    pub submission_date: String,

    /// Device/session info fields
    pub record: NormalizedRecord,

    /// Per-app usage rows
    pub apps: Vec<AppUsageRow>,

    /// Per-provider search rows
    pub searches: Vec<SearchRow>,

    /// Non-fatal conditions observed while shaping
    pub diagnostics: Vec<String>,
}

impl PayloadShaper {
    /// Shape one AU submission into an info record plus derived rows.
    ///
    /// Hard rejects: malformed payload, failed consistency check, residual
    /// nesting, missing deviceID/start/stop identity, missing OS version.
    pub fn shape_appusage(
        &self,
        envelope: &SubmissionEnvelope,
    ) -> std::result::Result<ShapedUsage, RejectReason> {
        let payload = envelope.payload_value()?;
        let mut payload = match payload {
            Value::Object(map) => map,
            _ => return Err(RejectReason::MalformedPayload),
        };

        if !Self::consistent_info(&payload, REASON_APPUSAGE) {
            return Err(RejectReason::Inconsistent);
        }
        Self::extract_geo_country(&mut payload);

        // The usage maps are nested by design; pull them out before the
        // flattening pass so they are not mistaken for a new payload shape.
        let apps_value = payload.remove("apps");
        let searches_value = payload.remove("searches");

        let mut flat = flatten_payload(payload)?;
        let mut diagnostics = Vec::new();

        // Session identity.
        let device_id =
            flat_str(&flat, fields::DEVICE_ID).ok_or(RejectReason::MissingField("device identity"))?;
        let start = flat
            .get(fields::START)
            .and_then(Value::as_i64)
            .ok_or(RejectReason::MissingField("device identity"))?;
        let stop = flat
            .get(fields::STOP)
            .and_then(Value::as_i64)
            .ok_or(RejectReason::MissingField("device identity"))?;
        let identity = PingIdentity::new(device_id, start, stop);

        // Measurement window dates, converted without range rejection.
        let start_date = Self::ms_timestamp_to_date(&Value::from(start), "start time")?;
        let stop_date = Self::ms_timestamp_to_date(&Value::from(stop), "stop time")?;

        if let Some(diagnostic) = Self::merge_update_channels(&mut flat) {
            diagnostics.push(diagnostic);
        }

        // Field normalizers.
        let os = normalize_os(flat_str(&flat, fields::OS).as_deref(), self.valid_os())?;
        let device = normalize_device(
            flat_str(&flat, fields::PRODUCT_MODEL).as_deref(),
            self.tables(),
        );
        let country = normalize_country(flat_str(&flat, fields::COUNTRY).as_deref(), self.tables());
        let operator = self.session_operator(&flat);
        let language = flat_str(&flat, fields::LOCALE)
            .and_then(|locale| lookup_language(&locale, self.tables()).map(String::from));
        let standardized_channel =
            flat_str(&flat, fields::UPDATE_CHANNEL).map(|channel| standardize_channel(&channel));

        let submission_date = Self::submission_date_iso(envelope.submission_date())
            .unwrap_or_else(|| MISSING_PLACEHOLDER.to_string());

        let mut record = Self::record_from_flat(flat);
        record.insert(
            fields::START_DATE,
            start_date.format(ISO_DATE_FORMAT).to_string(),
        );
        record.insert(
            fields::STOP_DATE,
            stop_date.format(ISO_DATE_FORMAT).to_string(),
        );
        if !submission_date.is_empty() {
            record.insert(fields::SUBMISSION_DATE, submission_date.clone());
        }
        record.insert(fields::OS, os);
        record.insert(fields::PRODUCT_MODEL, device);
        record.insert(fields::COUNTRY, country);
        record.insert(fields::OPERATOR, operator);
        if let Some(language) = language {
            record.insert(fields::LANGUAGE, language);
        }
        if let Some(channel) = standardized_channel {
            record.insert(fields::UPDATE_CHANNEL_STANDARDIZED, channel);
        }

        apply_record_hooks(&mut record);

        Ok(ShapedUsage {
            identity,
            submission_date,
            record,
            apps: explode_apps(apps_value),
            searches: explode_searches(searches_value),
            diagnostics,
        })
    }

    /// Resolve the session operator from the flattened SIM/network groups
    fn session_operator(&self, flat: &BTreeMap<String, Value>) -> String {
        let source = |mcc_key: &str, mnc_key: &str, name_key: &str| {
            let source = OperatorSource {
                mcc: flat_str(flat, mcc_key),
                mnc: flat_str(flat, mnc_key),
                name: flat_str(flat, name_key),
            };
            if source == OperatorSource::default() {
                None
            } else {
                Some(source)
            }
        };

        let icc = source(fields::ICC_MCC, fields::ICC_MNC, fields::ICC_SPN);
        let network = source(
            fields::NETWORK_MCC,
            fields::NETWORK_MNC,
            fields::NETWORK_OPERATOR,
        );

        normalize_operator(icc.as_ref(), network.as_ref(), self.tables())
    }
}

/// Explode the nested per-date per-app usage map into rows.
///
/// Entries with unexpected shapes are skipped; a malformed app entry should
/// not cost the whole payload.
fn explode_apps(value: Option<Value>) -> Vec<AppUsageRow> {
    let mut rows = Vec::new();
    let dates = match value {
        Some(Value::Object(dates)) => dates,
        _ => return rows,
    };

    for (usage_date, apps) in dates {
        let apps = match apps {
            Value::Object(apps) => apps,
            _ => continue,
        };
        for (app_url, metrics) in apps {
            let metrics = match metrics {
                Value::Object(metrics) => metrics,
                _ => continue,
            };
            rows.push(AppUsageRow {
                usage_date: usage_date.clone(),
                app_url,
                usage_time_s: metric(&metrics, "usageTime"),
                invocations: metric(&metrics, "invocations"),
                installs: metric(&metrics, "installs"),
                uninstalls: metric(&metrics, "uninstalls"),
                activities: render_activities(metrics.get("activities")),
            });
        }
    }
    rows
}

/// Explode the nested per-date per-provider search map into rows
fn explode_searches(value: Option<Value>) -> Vec<SearchRow> {
    let mut rows = Vec::new();
    let dates = match value {
        Some(Value::Object(dates)) => dates,
        _ => return rows,
    };

    for (search_date, providers) in dates {
        let providers = match providers {
            Value::Object(providers) => providers,
            _ => continue,
        };
        for (provider, count) in providers {
            rows.push(SearchRow {
                search_date: search_date.clone(),
                provider,
                count: count.as_i64().unwrap_or(0),
            });
        }
    }
    rows
}

/// Read one numeric usage metric, defaulting to zero
fn metric(metrics: &Map<String, Value>, name: &str) -> i64 {
    metrics.get(name).and_then(Value::as_i64).unwrap_or(0)
}

/// Join activity counts as sorted `name:count` pairs separated by `;`
fn render_activities(value: Option<&Value>) -> String {
    let activities = match value.and_then(Value::as_object) {
        Some(activities) => activities,
        None => return String::new(),
    };

    let mut pairs: Vec<String> = activities
        .iter()
        .map(|(name, count)| format!("{}:{}", name, value_to_string(count)))
        .collect();
    pairs.sort();
    pairs.join(";")
}
