//! Field normalization for telemetry records
//!
//! This module converts one raw field value at a time into a canonical
//! category, using ordered pattern-match rules with fallback and
//! default/"Other"/"Unknown" semantics:
//!
//! - [`os`] - OS version parsing, truncation, and validation
//! - [`device`] - device-model canonicalization and prefix whitelisting
//! - [`operator`] - carrier resolution with multi-source fallback
//! - [`country`] - geo-code resolution and launch-country whitelisting
//! - [`locale`] - locale-to-language lookup and channel standardization
//! - [`rules`] - the shared substitution-rule tables and application modes
//! - [`hooks`] - whole-record overrides applied after field normalization
//!
//! Normalizers are pure functions of their input and the shared read-only
//! [`ReferenceData`](crate::app::services::reference_data::ReferenceData),
//! so the batch harness can run them concurrently across records without
//! coordination.
//!
//! Two sentinels partition failures: "Unknown" means the payload did not
//! carry the field, "Other" means it did but the value is not one we track
//! distinctly. Keeping the two separate lets dashboards distinguish
//! missing data from long-tail values.

pub mod country;
pub mod device;
pub mod hooks;
pub mod locale;
pub mod operator;
pub mod os;
pub mod rules;

#[cfg(test)]
pub mod tests;

// Re-export the main entry points for easy access
pub use country::{normalize_country, resolve_country_code, summarize_country};
pub use device::{canonicalize_device, normalize_device, summarize_device};
pub use hooks::apply_record_hooks;
pub use locale::{base_locale, lookup_language, standardize_channel};
pub use operator::{
    OperatorSource, canonicalize_operator, normalize_operator, resolve_operator,
    summarize_operator,
};
pub use os::{canonicalize_os, normalize_os, summarize_os};
