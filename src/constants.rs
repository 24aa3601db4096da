//! Application constants for the ping processor
//!
//! This module contains payload markers, condition names, output schemas,
//! and default values used throughout the ping processor.

// =============================================================================
// Payload Markers
// =============================================================================

/// Application identity expected in every payload's `info.appName`
pub const EXPECTED_APP_NAME: &str = "FirefoxOS";

/// Ping-reason tag for first-time-use submissions
pub const REASON_FTU: &str = "ftu";

/// Ping-reason tag for app-usage submissions
pub const REASON_APPUSAGE: &str = "appusage";

/// Prefix carried by device-info fields at the payload top level
pub const DEVICEINFO_PREFIX: &str = "deviceinfo.";

// =============================================================================
// Sentinel Values
// =============================================================================

/// Classification for values that are present but not recognized
pub const OTHER: &str = "Other";

/// Classification for values that are absent from the payload
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for a missing field when rendering an ordered schema
pub const MISSING_PLACEHOLDER: &str = "";

/// Roll-up marker substituted for a dimension in "All" expansion
pub const ALL_MARKER: &str = "All";

/// OS label assigned to Tarako-class hardware
pub const TARAKO_OS_LABEL: &str = "1.3T";

// =============================================================================
// Condition Names
// =============================================================================

/// Names under which per-record outcomes are counted.
///
/// These strings appear in the diagnostics report and must stay stable
/// across runs so that dashboards tracking them keep working.
pub mod conditions {
    /// Payload was not parseable as JSON
    pub const MALFORMED_PAYLOAD: &str = "malformed payload";

    /// Identity marker fields failed the consistency check
    pub const INCONSISTENT: &str = "inconsistent";

    /// A nested object survived flattening
    pub const MULTIPLE_NESTING: &str = "multiple nesting";

    /// Ping time missing from the payload
    pub const NO_PING_TIME: &str = "no ping time";

    /// Ping time present but not interpretable as a timestamp
    pub const INVALID_PING_TIME: &str = "invalid ping time";

    /// Ping date fell outside the accepted reporting window
    pub const OUTSIDE_DATE_RANGE: &str = "outside date range";

    /// OS version missing from the payload
    pub const NO_OS_VERSION: &str = "no os version";

    /// deviceID/start/stop identity fields missing
    pub const MISSING_IDENTITY: &str = "missing identity";

    /// Ping start time later than its stop time
    pub const CLOCK_SKEW: &str = "clockskew";

    /// Ping range fully contained in an already-kept range
    pub const NESTED: &str = "nested";

    /// Ping overlaps the previous kept ping beyond tolerance (kept)
    pub const OVERLAP: &str = "overlap";

    /// Ping overlaps the previous kept ping within tolerance (kept)
    pub const NEGLIGIBLE_OVERLAP: &str = "negligibleoverlap";

    /// Distinct info rows observed for one ping identity
    pub const MULTIPLE_INFO: &str = "multiple";

    /// Prefix used when both update-channel fields are present but disagree
    pub const MULTIPLE_CHANNELS_PREFIX: &str = "multiple channels";
}

// =============================================================================
// Counter Names
// =============================================================================

/// Total records seen by a run
pub const COUNTER_RECORDS: &str = "nrecords";

// =============================================================================
// Output Row Tags
// =============================================================================

pub mod tags {
    /// FTU counted-tuple rows
    pub const DATUM: &str = "datum";

    /// AU device/session info rows
    pub const INFO: &str = "info";

    /// AU per-app usage rows
    pub const APP: &str = "app";

    /// AU per-provider search rows
    pub const SEARCH: &str = "search";

    /// Diagnostic counter rows
    pub const COUNTER: &str = "counter";

    /// Diagnostic condition rows
    pub const CONDITION: &str = "condition";
}

// =============================================================================
// Canonical Field Names
// =============================================================================

/// Flat field names produced by the record shaper
pub mod fields {
    pub const PING_DATE: &str = "pingDate";
    pub const SUBMISSION_DATE: &str = "submissionDate";
    pub const ACTIVATION_DATE: &str = "activationDate";
    pub const START_DATE: &str = "startDate";
    pub const STOP_DATE: &str = "stopDate";
    pub const OS: &str = "os";
    pub const COUNTRY: &str = "country";
    pub const OPERATOR: &str = "operator";
    pub const PRODUCT_MODEL: &str = "product_model";
    pub const LOCALE: &str = "locale";
    pub const LANGUAGE: &str = "language";
    pub const UPDATE_CHANNEL: &str = "update_channel";
    pub const UPDATE_CHANNEL_STANDARDIZED: &str = "update_channel_standardized";
    pub const APP_UPDATE_CHANNEL: &str = "app.update.channel";
    pub const PLATFORM_VERSION: &str = "platform_version";
    pub const PLATFORM_BUILD_ID: &str = "platform_build_id";
    pub const ICC_MCC: &str = "icc.mcc";
    pub const ICC_MNC: &str = "icc.mnc";
    pub const ICC_SPN: &str = "icc.spn";
    pub const ICC_COUNTRY: &str = "icc.country";
    pub const ICC_NETWORK: &str = "icc.network";
    pub const ICC_NAME: &str = "icc.name";
    pub const NETWORK_MCC: &str = "network.mcc";
    pub const NETWORK_MNC: &str = "network.mnc";
    pub const NETWORK_OPERATOR: &str = "network.operator";
    pub const NETWORK_COUNTRY: &str = "network.country";
    pub const NETWORK_NETWORK: &str = "network.network";
    pub const NETWORK_NAME: &str = "network.name";
    pub const SCREEN_WIDTH: &str = "screenWidth";
    pub const SCREEN_HEIGHT: &str = "screenHeight";
    pub const DEVICE_PIXEL_RATIO: &str = "devicePixelRatio";
    pub const SOFTWARE: &str = "software";
    pub const HARDWARE: &str = "hardware";
    pub const FIRMWARE_REVISION: &str = "firmware_revision";
    pub const DEVICE_ID: &str = "deviceID";
    pub const START: &str = "start";
    pub const STOP: &str = "stop";
}

// =============================================================================
// Output Schemas
// =============================================================================

/// Field order for the FTU counted tuple, shared by the dump CSV and the
/// dashboard accumulator. Missing fields render as the empty placeholder.
pub const FTU_FINAL_KEYS: &[&str] = &[
    fields::PING_DATE,
    fields::SUBMISSION_DATE,
    fields::OS,
    fields::COUNTRY,
    fields::PRODUCT_MODEL,
    fields::LOCALE,
    fields::LANGUAGE,
    fields::UPDATE_CHANNEL,
    fields::UPDATE_CHANNEL_STANDARDIZED,
    fields::PLATFORM_VERSION,
    fields::PLATFORM_BUILD_ID,
    fields::ICC_MCC,
    fields::ICC_MNC,
    fields::ICC_COUNTRY,
    fields::ICC_NETWORK,
    fields::ICC_NAME,
    fields::NETWORK_MCC,
    fields::NETWORK_MNC,
    fields::NETWORK_COUNTRY,
    fields::NETWORK_NETWORK,
    fields::NETWORK_NAME,
    fields::SCREEN_WIDTH,
    fields::SCREEN_HEIGHT,
    fields::DEVICE_PIXEL_RATIO,
    fields::SOFTWARE,
    fields::HARDWARE,
    fields::FIRMWARE_REVISION,
    fields::ACTIVATION_DATE,
];

/// Column headers for the FTU dump CSV (FTU_FINAL_KEYS plus trailing count)
pub const FTU_DUMP_CSV_HEADERS: &[&str] = &[
    "ping_date",
    "submission_date",
    "os",
    "country",
    "device",
    "locale",
    "language",
    "update_channel",
    "update_channel_standardized",
    "platform_version",
    "platform_build_id",
    "sim_mcc",
    "sim_mnc",
    "sim_mcc_country",
    "sim_mnc_network",
    "sim_network_name",
    "network_mcc",
    "network_mnc",
    "network_mcc_country",
    "network_mnc_network",
    "network_network_name",
    "screen_width",
    "screen_height",
    "device_pixel_ratio",
    "software",
    "hardware",
    "firmware_revision",
    "activation_date",
    "count",
];

/// Column headers for the FTU dashboard CSV
pub const DASHBOARD_CSV_HEADERS: &[&str] =
    &["date", "os", "country", "device", "operator", "activations"];

/// Device/session fields carried on each AU info row, in output order
pub const AU_INFO_FIELD_KEYS: &[&str] = &[
    fields::OS,
    fields::COUNTRY,
    fields::OPERATOR,
    fields::PRODUCT_MODEL,
    fields::LOCALE,
    fields::LANGUAGE,
    fields::UPDATE_CHANNEL,
    fields::UPDATE_CHANNEL_STANDARDIZED,
    fields::PLATFORM_VERSION,
    fields::PLATFORM_BUILD_ID,
    fields::SCREEN_WIDTH,
    fields::SCREEN_HEIGHT,
    fields::DEVICE_PIXEL_RATIO,
    fields::SOFTWARE,
    fields::HARDWARE,
    fields::FIRMWARE_REVISION,
];

/// Column headers for the AU info CSV
pub const AU_INFO_CSV_HEADERS: &[&str] = &[
    "device_id",
    "start",
    "stop",
    "submission_date",
    "os",
    "country",
    "operator",
    "device",
    "locale",
    "language",
    "update_channel",
    "update_channel_standardized",
    "platform_version",
    "platform_build_id",
    "screen_width",
    "screen_height",
    "device_pixel_ratio",
    "software",
    "hardware",
    "firmware_revision",
    "is_dogfood",
    "count",
];

/// Column headers for the AU app-usage CSV
pub const AU_APP_CSV_HEADERS: &[&str] = &[
    "device_id",
    "start",
    "stop",
    "usage_date",
    "app_url",
    "usage_time_s",
    "invocations",
    "installs",
    "uninstalls",
    "activities",
];

/// Column headers for the AU search CSV
pub const AU_SEARCH_CSV_HEADERS: &[&str] = &[
    "device_id",
    "start",
    "stop",
    "search_date",
    "provider",
    "count",
];

/// Leading columns of the dogfood details CSV; the device-info field
/// columns from the info table follow them
pub const AU_DOGFOOD_DETAILS_CSV_HEADERS: &[&str] = &[
    "device_id",
    "earliest_start",
    "latest_stop",
    "earliest_submission",
    "latest_submission",
    "num_pings",
    "changed_info",
];

/// Column headers for the dogfood app-usage CSV
pub const AU_DOGFOOD_APPUSAGE_CSV_HEADERS: &[&str] = &[
    "device_id",
    "usage_date",
    "app_url",
    "usage_time_s",
    "invocations",
    "installs",
    "uninstalls",
    "activities",
];

// =============================================================================
// Output Filenames
// =============================================================================

pub const DUMP_CSV_FILENAME: &str = "dump.csv";
pub const DASHBOARD_CSV_FILENAME: &str = "dashboard.csv";
pub const INFO_CSV_FILENAME: &str = "info.csv";
pub const APP_CSV_FILENAME: &str = "app.csv";
pub const SEARCH_CSV_FILENAME: &str = "search.csv";
pub const DOGFOOD_DETAILS_CSV_FILENAME: &str = "dogfood_details.csv";
pub const DOGFOOD_APPUSAGE_CSV_FILENAME: &str = "dogfood_appusage.csv";

// =============================================================================
// Date Formats
// =============================================================================

/// Format of the server-side submission date carried in the dimension list
pub const SUBMISSION_DATE_FORMAT: &str = "%Y%m%d";

/// ISO date format used for all emitted calendar dates
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Index of the submission date within the dimension list
pub const SUBMISSION_DATE_DIM_INDEX: usize = 5;

/// Expected dimension list length when a submission date is present
pub const DIMS_WITH_SUBMISSION_DATE: usize = 6;

// =============================================================================
// Processing Defaults
// =============================================================================

/// Overlap below this many milliseconds between consecutive pings is
/// treated as negligible
pub const DEFAULT_OVERLAP_TOLERANCE_MS: i64 = 5000;

/// Accepted form of a normalized OS version string
pub const DEFAULT_VALID_OS_PATTERN: &str = r"^(1\.[34]|2\.[0-9]|3\.[0-9])(T|\s\(pre-release\))?$";

/// Earliest calendar date accepted for a ping
pub const DEFAULT_EARLIEST_PING_DATE: &str = "2013-01-01";

/// Device IDs matching this pattern belong to the dogfood cohort
pub const DEFAULT_DOGFOOD_DEVICE_PATTERN: &str = "^(foxfood|dogfood)";

/// Days of history included in the dashboard dataset
pub const DEFAULT_DASHBOARD_WINDOW_DAYS: i64 = 180;

/// Days of history included in the dump dataset
pub const DEFAULT_DUMP_WINDOW_DAYS: i64 = 90;

/// Default number of input files shaped concurrently
pub const DEFAULT_PARALLEL_WORKERS: usize = 8;

/// Extension of envelope files discovered under the input path
pub const ENVELOPE_FILE_EXTENSION: &str = "ndjson";

/// Progress bar update granularity (records)
pub const PROGRESS_UPDATE_INTERVAL: usize = 1000;
