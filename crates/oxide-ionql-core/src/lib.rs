//! # oxide-ionql-core
//!
//! Front end for a PartiQL-style query language over nested, schemaless
//! data.
//!
//! This crate provides:
//! - A table-driven lexer with a multi-word keyword merge pass
//! - A precedence-climbing recursive descent parser producing a typed AST
//! - AST nodes carrying metadata such as source locations
//! - A versioned s-expression wire format for persisting parsed queries
//!
//! ## Parsing
//!
//! ```rust
//! use oxide_ionql_core::ast::{ExprKind, NAryOp};
//! use oxide_ionql_core::parse_statement;
//!
//! let expr = parse_statement("1 + 2 * 3").unwrap();
//! let (op, args) = expr.as_nary().unwrap();
//! assert_eq!(op, NAryOp::Add);
//! assert!(matches!(args[1].kind, ExprKind::NAry { op: NAryOp::Mul, .. }));
//! ```
//!
//! ## Serialization
//!
//! ```rust
//! use oxide_ionql_core::{deserialize_str, parse_statement, serialize_to_string};
//!
//! let expr = parse_statement("SELECT a FROM t WHERE a > 1").unwrap();
//! let text = serialize_to_string(&expr);
//! assert!(text.starts_with("(ast (version 1)"));
//! assert_eq!(deserialize_str(&text).unwrap(), expr);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod protocol;
pub mod value;

pub use ast::Expr;
pub use error::{Error, InternalError, Result};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{ParseError, ParseOptions, Parser};
pub use protocol::{
    deserialize, deserialize_str, serialize, serialize_to_string, serialize_with_version,
    AstVersion, ProtocolError,
};
pub use value::Value;

/// Parses one statement with default options.
///
/// # Errors
///
/// Returns [`Error::Lex`] or [`Error::Parse`] if the text is not a valid
/// statement.
pub fn parse_statement(source: &str) -> Result<Expr> {
    Parser::new(source).parse_statement()
}
