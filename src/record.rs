//! Page record model
//!
//! A [`PageRecord`] is the unit the crawl layer hands over: one crawled
//! page's captured HTML plus metadata, persisted as a UTF-8 JSON object.
//! The wire format uses camelCase field names (the records are produced by
//! a JavaScript crawler) and may carry fields this crate does not interpret
//! (`textContent`, debugging payloads, ...). Those extras are retained in
//! [`PageRecord::extra`] so the JSON output format reproduces the original
//! objects instead of a lossy projection.
//!
//! Records are immutable once read; conversion always builds new strings
//! and never writes back into a record.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BundleError;

/// One crawled page's captured HTML and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Absolute URL the page was crawled from
    pub url: String,
    /// Display title (content-extraction title, falling back to `<title>`)
    pub title: String,
    /// HTML fragment to convert (selected subtree or full body)
    pub content: String,
    /// Marker id -> language, for restoring fenced-code-block languages
    /// stripped by DOM preprocessing. Matched against `data-language-id`
    /// attributes in `content`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub code_languages: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Fields this crate does not interpret, preserved for JSON output
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of reading one record file
///
/// Parse failures are an explicit outcome rather than an `Err`: the driver
/// skips the offending file, logs a warning and keeps going. Only I/O
/// failures (an unreadable file) abort the run.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The file held a well-formed page record
    Parsed(PageRecord),
    /// The file was readable but not a valid record; reason says why
    Skipped { reason: String },
}

/// Read and parse one record file
///
/// Returns `Err` only when the file cannot be read at all. Invalid JSON or
/// a missing required field yields `Ok(RecordOutcome::Skipped { .. })` so a
/// half-parsed object can never end up inside a batch.
pub fn read_record(path: &Path) -> Result<RecordOutcome, BundleError> {
    let raw = fs::read_to_string(path).map_err(|e| BundleError::io(path, e))?;
    match serde_json::from_str::<PageRecord>(&raw) {
        Ok(record) => Ok(RecordOutcome::Parsed(record)),
        Err(err) => Ok(RecordOutcome::Skipped {
            reason: err.to_string(),
        }),
    }
}
