//! Lexer error types.

use thiserror::Error;

/// What went wrong while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A character that cannot start or continue any token.
    InvalidCharacter,
    /// An operator spelling that is not recognized, such as `!` or `|`.
    InvalidOperator,
    /// A numeric or string literal that cannot be represented, or a quoted
    /// literal left open at end of input.
    InvalidLiteral,
    /// Backtick-quoted content that is not a valid Ion value.
    InvalidIonLiteral,
    /// A `/*` comment left open at end of input.
    UnterminatedComment,
}

impl LexErrorKind {
    /// Returns a human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidCharacter => "invalid character",
            Self::InvalidOperator => "invalid operator",
            Self::InvalidLiteral => "invalid literal",
            Self::InvalidIonLiteral => "invalid Ion literal",
            Self::UnterminatedComment => "unterminated comment",
        }
    }
}

/// A lexer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} '{text}' at line {line}, column {column}{}", .kind.description(), detail_suffix(.detail.as_deref()))]
pub struct LexError {
    /// The error kind.
    pub kind: LexErrorKind,
    /// The offending text.
    pub text: String,
    /// 1-based line of the offending text.
    pub line: usize,
    /// 1-based column of the offending text.
    pub column: usize,
    /// Extra context, e.g. the Ion reader's message.
    pub detail: Option<String>,
}

impl LexError {
    /// Creates a new lexer error.
    #[must_use]
    pub fn new(kind: LexErrorKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            column,
            detail: None,
        }
    }

    /// Attaches extra context.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map_or_else(String::new, |d| format!(": {d}"))
}
