//! Query lexer.
//!
//! A table-driven state machine turns source text into tokens one code
//! point at a time, then a merge pass folds multi-word keywords and
//! operators (`NOT IN`, `LEFT OUTER JOIN`) into single tokens.

mod error;
mod merge;
mod span;
mod states;
mod token;
mod tokenizer;

pub use error::{LexError, LexErrorKind};
pub use span::Span;
pub use token::{Keyword, Operator, Token, TokenKind};
pub use tokenizer::{tokenize, Lexer};
