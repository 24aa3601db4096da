//! FxOS Ping Processor Library
//!
//! A Rust library for processing FxOS device telemetry ping dumps (FTU
//! "first-time-use" activations and AU "app-usage" sessions) into
//! deduplicated, aggregated CSV datasets for dashboards.
//!
//! This library provides tools for:
//! - Parsing newline-delimited JSON submission envelopes with dimension metadata
//! - Loading reference tables (country codes, mobile codes, languages, whitelists)
//!   for O(1) lookups
//! - Normalizing noisy free-text fields (OS version, device model, operator,
//!   country, locale) against ordered rule tables
//! - Reconciling per-device ping sessions: overlap classification, duplicate
//!   collapse, and conflict surfacing
//! - Counting occurrences of identical output rows with combiner/reducer-style
//!   additive merging
//! - Comprehensive error handling with per-record condition diagnostics

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod aggregator;
        pub mod normalizer;
        pub mod payload_shaper;
        pub mod reference_data;
        pub mod session_reconciler;
    }
    pub mod adapters {
        pub mod filesystem;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{FieldValue, NormalizedRecord, PingIdentity, RejectReason};
pub use app::services::reference_data::ReferenceData;
pub use config::Config;

/// Result type alias for the ping processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ping processing operations
///
/// These cover infrastructural failures only (I/O, malformed reference
/// tables, bad configuration). Per-record validation failures are not
/// errors: they are [`app::models::RejectReason`] values, counted as
/// conditions and never fatal to a batch.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error for a reference table or envelope file
    #[error("JSON error in '{file}': {message}")]
    Json {
        file: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// CSV writing error
    #[error("CSV error: {message}")]
    Csv {
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Reference table error (missing file, wrong shape)
    #[error("Reference table error: {message}")]
    ReferenceTable { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Date/time parsing error
    #[error("Date/time parsing error: {message}")]
    DateTimeParsing {
        message: String,
        #[source]
        source: chrono::ParseError,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Worker task failed (panic or cancellation in the runtime)
    #[error("Worker task failed: {message}")]
    Task { message: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a JSON error with context
    pub fn json(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<serde_json::Error>,
    ) -> Self {
        Self::Json {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a CSV error with context
    pub fn csv(message: impl Into<String>, source: Option<csv::Error>) -> Self {
        Self::Csv {
            message: message.into(),
            source,
        }
    }

    /// Create a reference table error
    pub fn reference_table(message: impl Into<String>) -> Self {
        Self::ReferenceTable {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a date/time parsing error
    pub fn datetime_parsing(message: impl Into<String>, source: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a worker task error
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            file: "unknown".to_string(),
            message: "JSON parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Csv {
            message: "CSV operation failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(error: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: "Date/time parsing failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}
