//! Error types for bundling operations

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can abort an aggregation run
///
/// Only unrecoverable conditions live here. A record file that fails to
/// parse is not an error at this level: it becomes
/// [`RecordOutcome::Skipped`](crate::record::RecordOutcome) and is surfaced
/// in the run summary instead. HTML that lacks the structure a conversion
/// rule expects is never an error at all; every rule degrades to plain
/// converted text.
#[derive(Debug)]
pub enum BundleError {
    /// The record store root does not exist
    RootNotFound(PathBuf),
    /// Reading or writing a file failed
    Io { path: PathBuf, source: io::Error },
    /// A record could not be re-serialized for output
    Serialize(serde_json::Error),
    /// The configuration file is unreadable or invalid
    InvalidConfig(String),
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::RootNotFound(path) => {
                write!(f, "record store root not found: {}", path.display())
            }
            BundleError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            BundleError::Serialize(err) => write!(f, "serialization error: {}", err),
            BundleError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for BundleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BundleError::Io { source, .. } => Some(source),
            BundleError::Serialize(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Serialize(err)
    }
}
