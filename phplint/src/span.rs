//! Diagnostic locations.
//!
//! Node spans come from the parser; diagnostics only keep the file and the
//! start position.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use phplint_parser::Span;

/// File, line and column of a diagnostic (1-indexed)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the start of `span` in `file`
    pub fn from_span(file: &Path, span: &Span) -> Self {
        Self::new(file, span.start_line, span.start_column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phplint_parser::SourceMap;

    #[test]
    fn test_from_span_uses_start() {
        let span = SourceMap::new("<?php\n  echo $x;\n").span(13, 15);
        let loc = Location::from_span(Path::new("a.php"), &span);
        assert_eq!((loc.line, loc.column), (2, 8));
        assert_eq!(loc.to_string(), "a.php:2:8");
    }
}
