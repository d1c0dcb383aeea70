//! Source locations
//!
//! Every CST node carries a [`Span`]; diagnostics report its start line and column.

use serde::{Deserialize, Serialize};

/// A byte range in a source file with resolved line/column endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    pub start: usize,
    /// Byte offset end (exclusive)
    pub end: usize,
    /// Line number (1-indexed)
    pub start_line: usize,
    /// Line number (1-indexed)
    pub end_line: usize,
    /// Column (1-indexed, in bytes)
    pub start_column: usize,
    /// Column (1-indexed, in bytes)
    pub end_column: usize,
}

impl Span {
    /// A zero-width span at the start of the file
    pub fn empty() -> Self {
        Self {
            start_line: 1,
            end_line: 1,
            start_column: 1,
            end_column: 1,
            ..Self::default()
        }
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(&self, other: &Span) -> Span {
        let (first, last) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        let end_src = if self.end >= other.end { self } else { other };
        Span {
            start: first.start,
            end: end_src.end.max(last.end),
            start_line: first.start_line,
            start_column: first.start_column,
            end_line: end_src.end_line,
            end_column: end_src.end_column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if a byte offset is within this span
    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

/// Line start table for converting byte offsets to line/column pairs
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1));
        Self { line_starts }
    }

    /// Number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-indexed (line, column) for a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        (line + 1, offset.saturating_sub(line_start) + 1)
    }

    /// Build a span with line/column information
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (start_line, start_column) = self.line_col(start);
        let (end_line, end_column) = self.line_col(end);
        Span {
            start,
            end,
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_after_php_tag() {
        let map = SourceMap::new("<?php\n$a = 1;\n");
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(6), (2, 1));
        assert_eq!(map.line_col(9), (2, 4));
        assert_eq!(map.line_count(), 3);
    }

    #[test]
    fn test_span_merge_orders_endpoints() {
        let map = SourceMap::new("foo\nbar baz\n");
        let a = map.span(4, 7);
        let b = map.span(0, 3);
        let merged = a.merge(&b);
        assert_eq!((merged.start, merged.end), (0, 7));
        assert_eq!((merged.start_line, merged.end_line), (1, 2));
        assert_eq!(merged.start_column, 1);
    }
}
