//! Configuration management and validation.
//!
//! Provides configuration structures for the normalization rules,
//! session reconciliation policies, and dataset windowing. The historical
//! constants (overlap tolerance, valid OS shape, launch date) live here as
//! defaults rather than as literals in the algorithms, so a run against a
//! different hardware generation only needs a different configuration.

use crate::constants::{
    DEFAULT_DASHBOARD_WINDOW_DAYS, DEFAULT_DOGFOOD_DEVICE_PATTERN, DEFAULT_DUMP_WINDOW_DAYS,
    DEFAULT_EARLIEST_PING_DATE, DEFAULT_OVERLAP_TOLERANCE_MS, DEFAULT_PARALLEL_WORKERS,
    DEFAULT_VALID_OS_PATTERN, ISO_DATE_FORMAT,
};
use crate::{Error, Result};
use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration for the field normalizers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Regex a normalized OS string must match to keep its distinct value.
    /// Non-matching strings classify as "Other".
    pub valid_os_pattern: String,

    /// Earliest calendar date accepted for a ping (ISO `yyyy-mm-dd`).
    /// Pings dated earlier are rejected as out of range.
    pub earliest_ping_date: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            valid_os_pattern: DEFAULT_VALID_OS_PATTERN.to_string(),
            earliest_ping_date: DEFAULT_EARLIEST_PING_DATE.to_string(),
        }
    }
}

impl NormalizerConfig {
    /// Compile the valid-OS pattern
    pub fn valid_os_regex(&self) -> Result<Regex> {
        Regex::new(&self.valid_os_pattern).map_err(|e| {
            Error::configuration(format!(
                "Invalid valid_os_pattern '{}': {}",
                self.valid_os_pattern, e
            ))
        })
    }

    /// Parse the earliest accepted ping date
    pub fn earliest_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.earliest_ping_date, ISO_DATE_FORMAT)
            .map_err(|e| Error::datetime_parsing("Invalid earliest_ping_date", e))
    }

    /// Latest accepted ping date: yesterday in the server's clock.
    /// A ping dated today may still be accumulating submissions.
    pub fn latest_date(&self) -> NaiveDate {
        Utc::now().date_naive() - Duration::days(1)
    }
}

/// Policy for resolving distinct info rows that share a ping identity and
/// differ only by submission date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the row with the earliest submission date (first seen wins)
    EarliestSubmission,
    /// Keep the row with the latest submission date
    LatestSubmission,
}

/// Configuration for the session/ping reconciler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Overlap between consecutive kept pings below this tolerance (ms)
    /// is tagged negligible rather than reported as a real overlap
    pub overlap_tolerance_ms: i64,

    /// Winner selection for info rows that differ only by submission date.
    /// Rows differing by any other field are never resolved automatically.
    pub duplicate_policy: DuplicatePolicy,

    /// Device IDs matching this regex are counted in the dogfood cohort
    pub dogfood_device_pattern: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            overlap_tolerance_ms: DEFAULT_OVERLAP_TOLERANCE_MS,
            duplicate_policy: DuplicatePolicy::EarliestSubmission,
            dogfood_device_pattern: DEFAULT_DOGFOOD_DEVICE_PATTERN.to_string(),
        }
    }
}

impl ReconcilerConfig {
    /// Compile the dogfood device pattern
    pub fn dogfood_regex(&self) -> Result<Regex> {
        Regex::new(&self.dogfood_device_pattern).map_err(|e| {
            Error::configuration(format!(
                "Invalid dogfood_device_pattern '{}': {}",
                self.dogfood_device_pattern, e
            ))
        })
    }
}

/// Submission-date windows applied when emitting datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Days of history included in the dashboard dataset
    pub dashboard_window_days: i64,

    /// Days of history included in the dump dataset
    pub dump_window_days: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            dashboard_window_days: DEFAULT_DASHBOARD_WINDOW_DAYS,
            dump_window_days: DEFAULT_DUMP_WINDOW_DAYS,
        }
    }
}

impl WindowConfig {
    /// Latest submission date included in any dataset: yesterday.
    pub fn latest_date(&self) -> String {
        (Utc::now().date_naive() - Duration::days(1))
            .format(ISO_DATE_FORMAT)
            .to_string()
    }

    /// Earliest submission date included in the dashboard dataset
    pub fn earliest_dashboard_date(&self) -> String {
        (Utc::now().date_naive() - Duration::days(self.dashboard_window_days))
            .format(ISO_DATE_FORMAT)
            .to_string()
    }

    /// Earliest submission date included in the dump dataset
    pub fn earliest_dump_date(&self) -> String {
        (Utc::now().date_naive() - Duration::days(self.dump_window_days))
            .format(ISO_DATE_FORMAT)
            .to_string()
    }
}

/// Global configuration for a processing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Field normalizer settings
    pub normalizer: NormalizerConfig,

    /// Session reconciler settings
    pub reconciler: ReconcilerConfig,

    /// Dataset windowing settings
    pub windows: WindowConfig,

    /// Number of envelope files shaped concurrently
    pub workers: usize,

    /// Show progress bars during long passes
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            reconciler: ReconcilerConfig::default(),
            windows: WindowConfig::default(),
            workers: DEFAULT_PARALLEL_WORKERS.min(num_cpus::get()),
            show_progress: true,
        }
    }
}

impl Config {
    /// Create configuration with a custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Create configuration with a custom overlap tolerance
    pub fn with_overlap_tolerance_ms(mut self, tolerance_ms: i64) -> Self {
        self.reconciler.overlap_tolerance_ms = tolerance_ms;
        self
    }

    /// Create configuration with a custom duplicate policy
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.reconciler.duplicate_policy = policy;
        self
    }

    /// Create configuration with a custom valid-OS pattern
    pub fn with_valid_os_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.normalizer.valid_os_pattern = pattern.into();
        self
    }

    /// Disable progress bars
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Validate that all configured patterns and dates parse
    pub fn validate(&self) -> Result<()> {
        self.normalizer.valid_os_regex()?;
        self.normalizer.earliest_date()?;
        self.reconciler.dogfood_regex()?;

        if self.reconciler.overlap_tolerance_ms < 0 {
            return Err(Error::configuration(format!(
                "overlap_tolerance_ms must be non-negative, got {}",
                self.reconciler.overlap_tolerance_ms
            )));
        }

        if self.workers == 0 {
            return Err(Error::configuration("workers must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_tolerance() {
        let config = Config::default();
        assert_eq!(config.reconciler.overlap_tolerance_ms, 5000);
        assert_eq!(
            config.reconciler.duplicate_policy,
            DuplicatePolicy::EarliestSubmission
        );
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::default()
            .with_workers(2)
            .with_overlap_tolerance_ms(1000)
            .with_duplicate_policy(DuplicatePolicy::LatestSubmission)
            .without_progress();

        assert_eq!(config.workers, 2);
        assert_eq!(config.reconciler.overlap_tolerance_ms, 1000);
        assert_eq!(
            config.reconciler.duplicate_policy,
            DuplicatePolicy::LatestSubmission
        );
        assert!(!config.show_progress);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = Config::default().with_valid_os_pattern("([unclosed");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = Config::default().with_overlap_tolerance_ms(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_os_regex_matches_expected_forms() {
        let re = NormalizerConfig::default().valid_os_regex().unwrap();
        assert!(re.is_match("1.3"));
        assert!(re.is_match("1.3T"));
        assert!(re.is_match("1.4"));
        assert!(re.is_match("2.0"));
        assert!(re.is_match("2.5 (pre-release)"));
        assert!(re.is_match("3.0"));
        assert!(!re.is_match("1.5"));
        assert!(!re.is_match("4.0"));
        assert!(!re.is_match("2.5.1"));
    }
}
