//! Filesystem adapter: envelope input and CSV output
//!
//! Keeps all file I/O out of the processing services. Input is
//! newline-delimited JSON envelope files; output is plain CSV tables.

use crate::app::models::{RejectReason, SubmissionEnvelope};
use crate::constants::ENVELOPE_FILE_EXTENSION;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Discover envelope files under an input path.
///
/// A file path is taken as-is; a directory is searched recursively for
/// `.ndjson` files. Results are sorted so runs are reproducible.
pub fn discover_envelope_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(Error::file_not_found(input.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == ENVELOPE_FILE_EXTENSION)
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        warn!("No .{} files found under {}", ENVELOPE_FILE_EXTENSION, input.display());
    } else {
        debug!("Discovered {} envelope files under {}", files.len(), input.display());
    }

    Ok(files)
}

/// Read one envelope file into per-line results.
///
/// A line that fails to parse as an envelope is a per-record malformed
/// outcome, not a file error: one bad line must not cost the batch.
pub fn read_envelope_lines(
    path: &Path,
) -> Result<Vec<std::result::Result<SubmissionEnvelope, RejectReason>>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

    let lines = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<SubmissionEnvelope>(line)
                .map_err(|_| RejectReason::MalformedPayload)
        })
        .collect();

    Ok(lines)
}

/// Write one CSV table, returning the number of data rows written
pub fn write_csv<I>(path: &Path, headers: &[&str], rows: I) -> Result<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("Failed to create {}", parent.display()), e))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::csv(format!("Failed to open {}", path.display()), Some(e)))?;

    writer
        .write_record(headers)
        .map_err(|e| Error::csv("Failed to write CSV header", Some(e)))?;

    let mut written = 0;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| Error::csv("Failed to write CSV row", Some(e)))?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|e| Error::io(format!("Failed to flush {}", path.display()), e))?;

    Ok(written)
}
