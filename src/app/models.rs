//! Data models for ping processing
//!
//! This module contains the core data structures for representing telemetry
//! submissions, normalized records, ping identities, and per-record outcome
//! classification.

use crate::constants::{self, conditions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Submission Envelope
// =============================================================================

/// One telemetry submission as handed over by the ingestion service
///
/// An envelope carries an opaque record key, a list of dimension strings,
/// and the raw payload. The sixth dimension entry, when the list has exactly
/// six entries, is the server-side submission date in `yyyymmdd` form; any
/// other list length means "dimensions absent" and is not an error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubmissionEnvelope {
    /// Opaque record key assigned by the ingestion service
    #[serde(default)]
    pub key: String,

    /// Dimension metadata attached by the ingestion service
    #[serde(default)]
    pub dims: Vec<String>,

    /// Raw payload: either an inline JSON object or a JSON string
    /// containing the encoded payload
    pub payload: serde_json::Value,
}

impl SubmissionEnvelope {
    /// Extract the server-side submission date from the dimension list.
    ///
    /// Returns the date as a `yyyymmdd` string, or `None` if the dimension
    /// list has the wrong length or the entry is not an 8-digit string.
    pub fn submission_date(&self) -> Option<&str> {
        if self.dims.len() != constants::DIMS_WITH_SUBMISSION_DATE {
            return None;
        }
        let sdate = self.dims[constants::SUBMISSION_DATE_DIM_INDEX].as_str();
        if sdate.len() == 8 && sdate.bytes().all(|b| b.is_ascii_digit()) {
            Some(sdate)
        } else {
            None
        }
    }

    /// Decode the payload into a JSON value.
    ///
    /// Payloads arrive either as inline objects or as JSON-encoded strings;
    /// a string that fails to parse is a malformed payload.
    pub fn payload_value(&self) -> std::result::Result<serde_json::Value, RejectReason> {
        match &self.payload {
            serde_json::Value::String(raw) => {
                serde_json::from_str(raw).map_err(|_| RejectReason::MalformedPayload)
            }
            other => Ok(other.clone()),
        }
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// A single flat field value in a normalized record
///
/// Values are scalars only; nested objects never survive the record shaper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Convert a scalar JSON value. Objects and arrays yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<FieldValue> {
        match value {
            serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(FieldValue::Int(i))
                } else {
                    n.as_f64().map(FieldValue::Float)
                }
            }
            serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
            serde_json::Value::Null => Some(FieldValue::Null),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
        }
    }

    /// View the value as a string slice, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// View the value as an integer, accepting numeric text
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Render the value for an output tuple. Null renders as the missing
    /// placeholder so that schema positions always carry a value.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Null => constants::MISSING_PLACEHOLDER.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

// =============================================================================
// Normalized Record
// =============================================================================

/// A flattened, normalized telemetry record
///
/// Maps canonical field names to scalar values. Built by the record shaper;
/// treated as immutable afterwards. Fields named by an output schema but
/// absent from the record render as the empty placeholder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl NormalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a field as text, if present and textual
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Render the record as an ordered value list following a schema.
    ///
    /// Each schema key is looked up in turn; missing or null fields render
    /// as the empty placeholder. Fields not named by the schema are ignored.
    pub fn to_ordered_values(&self, schema: &[&str]) -> Vec<String> {
        schema
            .iter()
            .map(|key| {
                self.fields
                    .get(*key)
                    .map(|v| v.render())
                    .unwrap_or_else(|| constants::MISSING_PLACEHOLDER.to_string())
            })
            .collect()
    }

    /// Compare two records for equality ignoring the named fields
    pub fn equals_ignoring(&self, other: &NormalizedRecord, ignored: &[&str]) -> bool {
        let filtered = |record: &NormalizedRecord| {
            record
                .fields
                .iter()
                .filter(|(k, _)| !ignored.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        filtered(self) == filtered(other)
    }
}

// =============================================================================
// Ping Identity
// =============================================================================

/// Unique identity of one reporting session from one device
///
/// At most one canonical info row exists per identity, barring duplicate
/// submissions detected by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PingIdentity {
    /// Reporting device identifier
    pub device_id: String,

    /// Measurement window start, milliseconds since the epoch
    pub start: i64,

    /// Measurement window stop, milliseconds since the epoch
    pub stop: i64,
}

impl PingIdentity {
    pub fn new(device_id: impl Into<String>, start: i64, stop: i64) -> Self {
        Self {
            device_id: device_id.into(),
            start,
            stop,
        }
    }

    /// An internally inconsistent ping reports a start after its stop,
    /// from a bug or a system clock change mid-session
    pub fn has_clock_skew(&self) -> bool {
        self.start > self.stop
    }

    /// Time range as a (start, stop) pair
    pub fn range(&self) -> (i64, i64) {
        (self.start, self.stop)
    }
}

// =============================================================================
// Reject Reasons
// =============================================================================

/// Per-record outcome classification
///
/// Replaces exception-based validation control flow: every record either
/// shapes cleanly or yields one of these. Rejections exclude the record
/// from output; overlap tags annotate kept records. Every variant maps to
/// a stable condition name for diagnostics counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Payload was not parseable as JSON
    MalformedPayload,

    /// Identity marker fields failed the consistency check
    Inconsistent,

    /// A nested object survived flattening, signalling a new payload shape
    ResidualNesting,

    /// A required field is absent; carries a short field description
    MissingField(&'static str),

    /// A field is present but not interpretable; carries the description
    InvalidFormat(&'static str),

    /// A date fell outside the accepted range
    OutOfRange,

    /// Ping start time later than its stop time
    ClockSkew,

    /// Ping range fully contained in an already-kept range
    Nested,

    /// Ping overlaps the previous kept ping beyond tolerance (record kept)
    Overlap,

    /// Ping overlaps the previous kept ping within tolerance (record kept)
    NegligibleOverlap,

    /// Distinct conflicting info rows share one ping identity
    MultipleConflictingRecords,
}

impl RejectReason {
    /// Stable condition name under which this outcome is counted
    pub fn condition(&self) -> String {
        match self {
            RejectReason::MalformedPayload => conditions::MALFORMED_PAYLOAD.to_string(),
            RejectReason::Inconsistent => conditions::INCONSISTENT.to_string(),
            RejectReason::ResidualNesting => conditions::MULTIPLE_NESTING.to_string(),
            RejectReason::MissingField(what) => format!("no {}", what),
            RejectReason::InvalidFormat(what) => format!("invalid {}", what),
            RejectReason::OutOfRange => conditions::OUTSIDE_DATE_RANGE.to_string(),
            RejectReason::ClockSkew => conditions::CLOCK_SKEW.to_string(),
            RejectReason::Nested => conditions::NESTED.to_string(),
            RejectReason::Overlap => conditions::OVERLAP.to_string(),
            RejectReason::NegligibleOverlap => conditions::NEGLIGIBLE_OVERLAP.to_string(),
            RejectReason::MultipleConflictingRecords => conditions::MULTIPLE_INFO.to_string(),
        }
    }

    /// Whether this outcome excludes the record from output.
    /// Overlap tags annotate kept records; everything else rejects.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            RejectReason::Overlap | RejectReason::NegligibleOverlap
        )
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.condition())
    }
}

// =============================================================================
// Cohorts
// =============================================================================

/// Reporting cohort a device belongs to, for partitioned diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cohort {
    /// Internal test devices, identified by device ID pattern
    Dogfood,
    /// Everyone else
    General,
}

impl Cohort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cohort::Dogfood => "dogfood",
            Cohort::General => "general",
        }
    }
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
