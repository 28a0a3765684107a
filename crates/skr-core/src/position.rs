use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A point in the source text.
///
/// `offset` is a zero-based byte offset; `line` and `column` are one-based,
/// with the column counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Zero-based byte offset from the start of the script.
    pub offset: usize,
    /// One-based line number.
    pub line: usize,
    /// One-based column number.
    pub column: usize,
}

impl SourcePosition {
    /// The position of the first character of any source.
    pub const START: SourcePosition = SourcePosition {
        offset: 0,
        line: 1,
        column: 1,
    };
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open region of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    /// Where the region starts.
    pub start: SourcePosition,
    /// Where the region ends (exclusive).
    pub end: SourcePosition,
}

impl SourceRange {
    /// Create a range from two positions.
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// The byte span covered by this range.
    pub fn span(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }

    /// Returns `true` if the start does not lie after the end.
    pub fn is_ordered(&self) -> bool {
        self.start.offset <= self.end.offset
    }

    /// Returns `true` if `other` lies entirely within this range.
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Converts byte offsets into line/column positions for one source string.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of `source`.
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// The indexed source text.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Number of lines in the source (an empty source has one line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        SourcePosition {
            offset,
            line: line + 1,
            column: column + 1,
        }
    }

    /// Range of a byte span.
    pub fn range(&self, span: Range<usize>) -> SourceRange {
        SourceRange {
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }

    /// Range covering the whole source.
    pub fn full_range(&self) -> SourceRange {
        self.range(0..self.source.len())
    }
}
