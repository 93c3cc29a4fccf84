//! Query parser.
//!
//! A precedence-climbing recursive descent parser builds a [`ParseNode`]
//! tree over an index cursor into the token buffer; [`to_expr`] then
//! projects that tree onto the AST.

mod convert;
mod error;
mod node;
mod parser;
mod precedence;

pub use convert::to_expr;
pub use error::{ErrorCode, ParseError};
pub use node::{ParseKind, ParseNode};
pub use parser::{ParseOptions, Parser, DEFAULT_MAX_DEPTH};
pub use precedence::{infix_precedence, prefix_precedence};
