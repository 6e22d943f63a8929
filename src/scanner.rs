//! Record store scanner
//!
//! Discovers persisted page records under a root directory and returns them
//! in the canonical total order. That order is the sole ordering authority
//! for final output: it must come out identical for any on-disk enumeration
//! order, so the scanner sorts explicitly instead of trusting directory
//! iteration.
//!
//! Ordering rule: records are compared by their path segments relative to
//! the root, segment by segment, lexicographically, with a missing trailing
//! segment comparing as the empty string (so shorter prefixes sort first).
//!
//! The scanner is read-only. A missing root is an error; an empty root is
//! an empty scan, not an error.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BundleError;

/// A discovered record file plus its structural sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    /// Absolute (or root-joined) path of the record file
    pub path: PathBuf,
    /// Path segments relative to the record root
    pub segments: Vec<String>,
}

impl RecordLocation {
    fn new(root: &Path, path: PathBuf) -> Self {
        let segments = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        RecordLocation { path, segments }
    }
}

/// Compare two segment sequences per the canonical ordering rule
///
/// Missing trailing segments compare as `""`. This is almost, but not
/// exactly, the derived `Ord` on `Vec<String>`, so it stays explicit.
pub fn compare_segments(a: &[String], b: &[String]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let part_a = a.get(i).map(String::as_str).unwrap_or("");
        let part_b = b.get(i).map(String::as_str).unwrap_or("");
        match part_a.cmp(part_b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Discover all record files under `root`, sorted canonically
///
/// Walks the tree recursively and collects `*.json` files only. Returns
/// [`BundleError::RootNotFound`] when `root` does not exist and an empty
/// vector when it exists but holds no records.
pub fn scan_records(root: &Path) -> Result<Vec<RecordLocation>, BundleError> {
    if !root.exists() {
        return Err(BundleError::RootNotFound(root.to_path_buf()));
    }

    let mut found = Vec::new();
    collect_records(root, root, &mut found)?;
    found.sort_by(|a, b| compare_segments(&a.segments, &b.segments));
    Ok(found)
}

fn collect_records(
    root: &Path,
    dir: &Path,
    out: &mut Vec<RecordLocation>,
) -> Result<(), BundleError> {
    let entries = fs::read_dir(dir).map_err(|e| BundleError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BundleError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_records(root, &path, out)?;
        } else if path.extension().map(|ext| ext == "json").unwrap_or(false) {
            out.push(RecordLocation::new(root, path));
        }
    }
    Ok(())
}
