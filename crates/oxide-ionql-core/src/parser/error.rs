//! Parser error types.

use thiserror::Error;

use crate::lexer::{Span, Token, TokenKind};

/// Why parsing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnexpectedToken,
    UnexpectedKeyword,
    UnexpectedEndOfInput,
    /// A required clause such as `FROM` is absent.
    MissingClause,
    /// A function or type received the wrong number of arguments.
    ArityMismatch,
    /// A non-inner join without `ON`.
    MalformedJoin,
    InvalidPathComponent,
    InvalidTypeParameter,
    NestingTooDeep,
}

/// A parse error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {span}")]
pub struct ParseError {
    /// The error category.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// Expected tokens (if applicable).
    pub expected: Option<String>,
    /// The actual token found.
    pub found: Option<TokenKind>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// Creates an error for a token that does not fit the grammar here.
    ///
    /// The code is chosen from the token: end of input, keyword or other.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: &Token) -> Self {
        if found.is_eof() {
            return Self::unexpected_eof(expected, found.span);
        }
        let expected: String = expected.into();
        let code = if found.is_keyword() {
            ErrorCode::UnexpectedKeyword
        } else {
            ErrorCode::UnexpectedToken
        };
        let shown = found
            .text()
            .map_or_else(|| found.kind.describe().to_string(), |t| format!("'{t}'"));
        Self {
            code,
            message: format!("Unexpected token: expected {expected}, found {shown}"),
            span: found.span,
            expected: Some(expected),
            found: Some(found.kind),
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        Self {
            code: ErrorCode::UnexpectedEndOfInput,
            message: format!("Unexpected end of input: expected {expected}"),
            span,
            expected: Some(expected),
            found: Some(TokenKind::Eof),
        }
    }
}
