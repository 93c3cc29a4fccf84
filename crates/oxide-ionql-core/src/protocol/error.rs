//! Protocol error types.

use thiserror::Error;

use super::tags::Arity;
use super::AstVersion;
use crate::value::ValueError;

/// Why a symbolic expression is not a valid serialized AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// The tag is not in the tag table.
    #[error("unknown tag '{tag}'")]
    UnknownTag { tag: String },

    /// The tag exists but not in the active protocol version.
    #[error("tag '{tag}' is not valid in AST {version}")]
    TagNotInVersion { tag: String, version: AstVersion },

    /// Wrong number of arguments for a known tag.
    #[error("tag '{tag}' takes {expected} arguments, found {found}")]
    ArityOutOfRange {
        tag: String,
        expected: Arity,
        found: usize,
    },

    /// The envelope names a version this crate does not speak.
    #[error("unsupported AST version {0}")]
    UnsupportedVersion(String),

    /// Structurally wrong content, such as a raw argument of the wrong type.
    #[error("malformed AST: {0}")]
    Malformed(String),

    #[error("AST nesting exceeds {max_depth} levels")]
    NestingTooDeep { max_depth: usize },

    /// The text form could not be read.
    #[error("invalid AST text: {0}")]
    InvalidText(#[from] ValueError),
}

impl ProtocolError {
    /// Creates a [`ProtocolError::Malformed`].
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
