//! Library error types.
//!
//! Diagnostics about the analyzed code are not errors: they are collected
//! into a [`Report`](crate::analyze::Report). The types here cover the
//! cases where the tool itself cannot proceed.

use std::path::PathBuf;

use thiserror::Error;

use crate::span::Location;

/// Failure to read or decode `phplint.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure to locate or read a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("no file declares '{name}'")]
    Unresolved { name: String },

    #[error("I/O error reading '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound { path }
        } else {
            LoadError::Io { path, source }
        }
    }
}

/// Fatal escalation: the rest of the file is not analyzed.
///
/// The diagnostic that caused the abort has already been recorded when
/// this value is produced.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{location}: analysis aborted: {reason}")]
pub struct AnalysisAbort {
    pub location: Location,
    pub reason: String,
}

impl AnalysisAbort {
    pub fn new(location: Location, reason: impl Into<String>) -> Self {
        Self {
            location,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = LoadError::io(
            "missing.php",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(err.to_string(), "file not found: missing.php");
    }

    #[test]
    fn test_abort_message_carries_location() {
        let abort = AnalysisAbort::new(Location::new("a.php", 4, 2), "goto is not supported");
        assert_eq!(
            abort.to_string(),
            "a.php:4:2: analysis aborted: goto is not supported"
        );
    }
}
