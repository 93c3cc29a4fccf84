//! Versioned s-expression wire format for the AST.
//!
//! Two versions exist. V0 has no envelope and wraps located nodes as
//! `(meta <node> {line: L, column: C})`. V1 wraps the tree in
//! `(ast (version 1) (root <node>))` and annotated nodes as
//! `(term (exp <node>) (meta (<tag> <payload>) ...))`.
//!
//! ```
//! use oxide_ionql_core::{deserialize, parse_statement, serialize};
//!
//! let expr = parse_statement("a NOT IN (1, 2)").unwrap();
//! let wire = serialize(&expr);
//! assert!(wire.to_string().contains("not_in"));
//! assert_eq!(deserialize(&wire).unwrap(), expr);
//! ```

mod deserializer;
mod error;
mod serializer;
pub mod tags;

use std::fmt;

pub use deserializer::{DeserializeOptions, Deserializer, MetaDecoder};
pub use error::ProtocolError;
pub use serializer::Serializer;

use crate::ast::Expr;
use crate::error::Result;
use crate::value::Value;

/// Wire protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AstVersion {
    V0,
    #[default]
    V1,
}

impl AstVersion {
    /// The version [`serialize`] emits.
    pub const CURRENT: Self = Self::V1;

    /// Returns the number written in the envelope.
    #[must_use]
    pub const fn number(&self) -> i64 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
        }
    }

    #[must_use]
    pub const fn from_number(n: i64) -> Option<Self> {
        match n {
            0 => Some(Self::V0),
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

impl fmt::Display for AstVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version {}", self.number())
    }
}

/// Serializes an expression in the current protocol version.
#[must_use]
pub fn serialize(expr: &Expr) -> Value {
    Serializer::new(AstVersion::CURRENT).serialize(expr)
}

/// Serializes an expression in the given protocol version.
#[must_use]
pub fn serialize_with_version(expr: &Expr, version: AstVersion) -> Value {
    Serializer::new(version).serialize(expr)
}

/// Serializes an expression to text in the current protocol version.
#[must_use]
pub fn serialize_to_string(expr: &Expr) -> String {
    serialize(expr).to_string()
}

/// Deserializes an expression in either protocol version.
///
/// # Errors
///
/// Returns [`crate::Error::Protocol`] if the value is not a valid
/// serialized AST.
pub fn deserialize(value: &Value) -> Result<Expr> {
    Ok(Deserializer::new().deserialize(value)?)
}

/// Reads and deserializes the text form of a serialized AST.
///
/// # Errors
///
/// Returns [`crate::Error::Protocol`] if the text cannot be read or is not
/// a valid serialized AST.
pub fn deserialize_str(text: &str) -> Result<Expr> {
    Ok(Deserializer::new().deserialize_str(text)?)
}
