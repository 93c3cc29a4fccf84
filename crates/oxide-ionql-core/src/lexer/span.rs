//! Source location tracking for tokens and AST nodes.

/// Represents a span in the source text.
///
/// Lines and columns are 1-based and count Unicode code points. CR, LF and
/// CRLF each count as a single line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Line of the first code point.
    pub line: usize,
    /// Column of the first code point.
    pub column: usize,
    /// Number of code points covered.
    pub length: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(line: usize, column: usize, length: usize) -> Self {
        Self {
            line,
            column,
            length,
        }
    }

    /// Returns true if the span covers no code points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns a span starting at `self` that extends to the end of `other`.
    ///
    /// When the two spans are on different lines the length of `self` is
    /// kept, since a length cannot describe a multi-line range.
    #[must_use]
    pub const fn cover(self, other: Self) -> Self {
        if other.line == self.line && other.column + other.length >= self.column {
            let end = other.column + other.length;
            let length = if end > self.column + self.length {
                end - self.column
            } else {
                self.length
            };
            Self { length, ..self }
        } else {
            self
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl core::fmt::Display for Span {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}
