//! Crate-wide error type.

use thiserror::Error;

use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::protocol::ProtocolError;

/// A parse tree shape the grammar never produces.
///
/// Seeing one means the parser and the AST projection disagree; it is
/// never caused by bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Tokenizing failed.
    #[error("lexer error: {0}")]
    Lex(#[from] LexError),

    /// The token stream is not a valid statement.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A symbolic expression is not a valid serialized AST.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// Returns true for implementation bugs, as opposed to bad input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

/// Result type alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_is_distinct() {
        let err: Error = InternalError::new("stray WHERE").into();
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "internal error: stray WHERE");

        let err: Error = ProtocolError::UnknownTag {
            tag: "frob".to_string(),
        }
        .into();
        assert!(!err.is_internal());
    }
}
