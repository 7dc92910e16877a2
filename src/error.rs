//! Centralized error type for the tiling harness.
//!
//! Every failure mode has a defined consequence:
//!
//! | Error           | Consequence                                    |
//! |-----------------|------------------------------------------------|
//! | UnknownScheme   | Fatal: no fallback scheme exists               |
//! | Io              | Fatal for the reporting pass, path attached    |
//! | PerfLog         | Fatal: timing series unusable                  |
//! | Report          | Fatal: report artifact not produced            |
//!
//! Malformed rows in a historical timing table are *not* an error: their
//! unparseable fields are dropped and the run continues (see
//! `report::timetable`).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Central error type for all harness operations.
#[derive(Debug)]
pub enum HarnessError {
    /// Fusion-scheme id is not in the supported table.
    UnknownScheme(u32),

    /// Filesystem operation on a result or log file failed.
    Io { path: PathBuf, source: io::Error },

    /// The performance-log artifact could not be parsed into the
    /// expected per-rank timing series.
    PerfLog(String),

    /// A report artifact could not be produced.
    Report(String),
}

impl HarnessError {
    /// Attach a path to an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::UnknownScheme(mode) => {
                write!(f, "unknown fusion scheme id {}", mode)
            }
            HarnessError::Io { path, source } => {
                write!(f, "I/O error on {:?}: {}", path, source)
            }
            HarnessError::PerfLog(msg) => {
                write!(f, "performance log parse failed: {}", msg)
            }
            HarnessError::Report(msg) => {
                write!(f, "report generation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
