//! Tokenizer driving the state table.

use tracing::debug;

use super::error::{LexError, LexErrorKind};
use super::merge::merge_tokens;
use super::states::{LexType, StateId, StateType, TokenType, TABLE};
use super::{Keyword, Operator, Span, Token, TokenKind};
use crate::value::{self, parse_decimal, parse_int, Value};

/// Position of a code point in the source.
#[derive(Debug, Clone, Copy)]
struct Position {
    index: usize,
    line: usize,
    column: usize,
}

/// A lexer that tokenizes query text.
pub struct Lexer<'a> {
    /// The input source text.
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenizes the whole input, merges multi-word keywords and operators,
    /// and appends an end-of-input token.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] on the first invalid character, operator or
    /// literal. No partial token list is returned.
    pub fn tokenize(&self) -> Result<Vec<Token>, LexError> {
        let (raw, end) = self.scan()?;
        let raw_count = raw.len();
        let mut tokens = merge_tokens(raw);
        tokens.push(Token::new(
            TokenKind::Eof,
            None,
            Span::new(end.line, end.column, 0),
        ));
        debug!(
            raw = raw_count,
            merged = tokens.len() - 1,
            "tokenized input"
        );
        Ok(tokens)
    }

    /// Runs the state machine, returning unmerged tokens and the final
    /// position.
    fn scan(&self) -> Result<(Vec<Token>, Position), LexError> {
        let chars: Vec<char> = self.input.chars().collect();
        let mut tokens = vec![];
        let mut buffer = String::new();
        let mut current = StateId::Initial;
        let mut pos = Position {
            index: 0,
            line: 1,
            column: 1,
        };
        let mut start = pos;

        loop {
            let cp = chars.get(pos.index).copied();
            let next = TABLE.next(current, cp);
            let current_type = TABLE.get(current).state_type;
            let next_state = TABLE.get(next);

            if next_state.state_type == StateType::Error {
                return Err(Self::error(&chars, current, cp, start, pos));
            }
            if next_state.state_type.begins_token() {
                if current_type.ends_token() {
                    if let Some(token) = Self::flush(current, &mut buffer, start, pos)? {
                        tokens.push(token);
                    }
                } else if current_type != StateType::Initial {
                    return Err(Self::error(&chars, current, cp, start, pos));
                }
                buffer.clear();
                start = pos;
            }

            let Some(c) = cp else {
                return Ok((tokens, pos));
            };
            if next_state.replacement.is_none() {
                buffer.push(c);
            }
            current = next;

            pos.index += 1;
            if c == '\n' || (c == '\r' && chars.get(pos.index) != Some(&'\n')) {
                pos.line += 1;
                pos.column = 1;
            } else if c != '\r' {
                pos.column += 1;
            }
        }
    }

    /// Builds the error for a failed transition out of `state`.
    fn error(
        chars: &[char],
        state: StateId,
        cp: Option<char>,
        start: Position,
        pos: Position,
    ) -> LexError {
        let current = TABLE.get(state);
        let is_operator = current.token_type == Some(TokenType::Operator);

        if cp.is_none() && current.state_type.is_incomplete() {
            let text: String = chars[start.index..].iter().collect();
            let kind = match current.lex_type {
                LexType::Whitespace => LexErrorKind::UnterminatedComment,
                LexType::Ion => LexErrorKind::InvalidIonLiteral,
                _ if is_operator => LexErrorKind::InvalidOperator,
                _ => LexErrorKind::InvalidLiteral,
            };
            return LexError::new(kind, text, start.line, start.column);
        }

        if current.state_type.is_incomplete() {
            let kind = if is_operator {
                LexErrorKind::InvalidOperator
            } else {
                LexErrorKind::InvalidLiteral
            };
            let text: String = chars[start.index..pos.index].iter().collect();
            return LexError::new(kind, text, start.line, start.column);
        }
        let text = cp.map_or_else(String::new, String::from);
        LexError::new(LexErrorKind::InvalidCharacter, text, pos.line, pos.column)
    }

    /// Converts the buffered text of a finished token into a token.
    /// Whitespace and comments produce nothing.
    fn flush(
        state: StateId,
        buffer: &mut String,
        start: Position,
        end: Position,
    ) -> Result<Option<Token>, LexError> {
        let state = TABLE.get(state);
        if state.lex_type == LexType::Whitespace {
            return Ok(None);
        }
        let Some(token_type) = state.token_type else {
            return Ok(None);
        };
        let span = Span::new(start.line, start.column, end.index - start.index);
        let invalid = |kind: LexErrorKind, text: &str| {
            LexError::new(kind, text, start.line, start.column)
        };

        if matches!(
            state.lex_type,
            LexType::SqString | LexType::DqString | LexType::Ion
        ) {
            // Opening quotes are dropped on entry; the closing one is
            // still buffered.
            buffer.pop();
        }

        let text = buffer.as_str();
        let token = match token_type {
            TokenType::Identifier => classify_identifier(text, span),
            TokenType::QuotedIdentifier => Token::new(
                TokenKind::QuotedIdentifier,
                Some(Value::symbol(text)),
                span,
            ),
            TokenType::Operator => {
                let op = Operator::from_text(text)
                    .ok_or_else(|| invalid(LexErrorKind::InvalidOperator, text))?;
                Token::new(
                    TokenKind::Operator(op),
                    Some(Value::symbol(op.as_str())),
                    span,
                )
            }
            TokenType::Literal => {
                let value = match state.lex_type {
                    LexType::Integer => parse_int(text).map(Value::Int),
                    LexType::Decimal => parse_decimal(text).map(Value::Decimal),
                    LexType::SqString => Some(Value::string(text)),
                    _ => None,
                }
                .ok_or_else(|| invalid(LexErrorKind::InvalidLiteral, text))?;
                Token::new(TokenKind::Literal, Some(value), span)
            }
            TokenType::IonLiteral => {
                let value = value::read(text).map_err(|e| {
                    invalid(LexErrorKind::InvalidIonLiteral, text).with_detail(e.to_string())
                })?;
                Token::new(TokenKind::IonLiteral, Some(value), span)
            }
            TokenType::Fixed(kind) => Token::new(kind, None, span),
        };
        Ok(Some(token))
    }
}

/// Reclassifies identifier text as a keyword, word operator, boolean
/// literal or distinguished keyword. Matching ignores case; plain
/// identifiers keep their original spelling.
fn classify_identifier(text: &str, span: Span) -> Token {
    let lower = text.to_ascii_lowercase();
    let symbol = || Some(Value::symbol(lower.as_str()));

    if let Some(kw) = Keyword::from_str(&lower).filter(|kw| !kw.is_composite()) {
        return Token::new(TokenKind::Keyword(kw), symbol(), span);
    }
    if let Some(op) = Operator::from_text(&lower).filter(Operator::is_alphabetic) {
        return Token::new(TokenKind::Operator(op), symbol(), span);
    }
    let kind = match lower.as_str() {
        "true" => return Token::new(TokenKind::Literal, Some(Value::Bool(true)), span),
        "false" => return Token::new(TokenKind::Literal, Some(Value::Bool(false)), span),
        "as" => TokenKind::As,
        "at" => TokenKind::At,
        "by" => TokenKind::By,
        "for" => TokenKind::For,
        "asc" => TokenKind::Asc,
        "desc" => TokenKind::Desc,
        "null" => TokenKind::Null,
        "missing" => TokenKind::Missing,
        _ => return Token::new(TokenKind::Identifier, Some(Value::symbol(text)), span),
    };
    Token::new(kind, symbol(), span)
}

/// Tokenizes `source`.
///
/// # Errors
///
/// Returns a [`LexError`] on the first invalid input.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use num_bigint::BigInt;
    use std::str::FromStr;

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn values(input: &str) -> Vec<Option<Value>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_simple_select() {
        let kinds = token_kinds("SELECT a FROM t");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifier_keeps_case() {
        assert_eq!(values("FooBar")[0], Some(Value::symbol("FooBar")));
        assert_eq!(values("SeLeCt")[0], Some(Value::symbol("select")));
    }

    #[test]
    fn test_numbers() {
        let vals = values("42 1.5 .5 1e3 123456789012345678901234567890");
        assert_eq!(vals[0], Some(Value::int(42)));
        assert_eq!(
            vals[1],
            Some(Value::Decimal(BigDecimal::from_str("1.5").unwrap()))
        );
        assert_eq!(
            vals[2],
            Some(Value::Decimal(BigDecimal::from_str("0.5").unwrap()))
        );
        assert_eq!(
            vals[3],
            Some(Value::Decimal(BigDecimal::from_str("1000").unwrap()))
        );
        assert_eq!(
            vals[4].as_ref().and_then(Value::as_int).map(ToString::to_string),
            Some("123456789012345678901234567890".to_string())
        );
    }

    #[test]
    fn test_strings_collapse_doubled_quotes() {
        assert_eq!(values("'it''s'")[0], Some(Value::string("it's")));
        assert_eq!(values("''")[0], Some(Value::string("")));
        assert_eq!(values("''''")[0], Some(Value::string("'")));
    }

    #[test]
    fn test_quoted_identifier() {
        let tokens = tokenize("\"Foo\"\"Bar\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::QuotedIdentifier);
        assert_eq!(tokens[0].value, Some(Value::symbol("Foo\"Bar")));
    }

    #[test]
    fn test_operators() {
        let kinds = token_kinds("+ - / % = <> != < <= > >= || @");
        let ops: Vec<_> = kinds
            .iter()
            .filter_map(|k| match k {
                TokenKind::Operator(op) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                Operator::Plus,
                Operator::Minus,
                Operator::Slash,
                Operator::Percent,
                Operator::Eq,
                Operator::Ne,
                Operator::Ne,
                Operator::Lt,
                Operator::Lte,
                Operator::Gt,
                Operator::Gte,
                Operator::Concat,
                Operator::AtSign,
            ]
        );
    }

    #[test]
    fn test_bag_delimiters() {
        let kinds = token_kinds("<<1>>");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftDoubleAngle,
                TokenKind::Literal,
                TokenKind::RightDoubleAngle,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let kinds = token_kinds("a -- comment\n/* block\n */ b");
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_ion_literal() {
        let tokens = tokenize("`{a: \"`\", b: [1, 2]}`").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IonLiteral);
        let value = tokens[0].value.as_ref().unwrap();
        assert_eq!(value.field("a"), Some(&Value::string("`")));
    }

    #[test]
    fn test_pseudo_keywords_and_booleans() {
        let kinds = token_kinds("AS at By for NULL missing TRUE");
        assert_eq!(
            &kinds[..7],
            &[
                TokenKind::As,
                TokenKind::At,
                TokenKind::By,
                TokenKind::For,
                TokenKind::Null,
                TokenKind::Missing,
                TokenKind::Literal,
            ]
        );
    }

    #[test]
    fn test_positions_count_crlf_once() {
        let tokens = tokenize("a\r\n  b\rc").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3, 1));
        assert_eq!(tokens[2].span, Span::new(3, 1, 1));
    }

    #[test]
    fn test_unterminated_string_reports_opening_quote() {
        let err = tokenize("SELECT\n  'abc").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidLiteral);
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn test_invalid_character() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidCharacter);
        assert_eq!(err.text, "#");
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn test_invalid_operator() {
        let err = tokenize("a ! b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidOperator);
        let err = tokenize("a |").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidOperator);
        assert_eq!((err.line, err.column), (1, 3));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("a /* never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_invalid_ion_literal() {
        let err = tokenize("`{a 1}`").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidIonLiteral);
        let err = tokenize("`unclosed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidIonLiteral);
    }

    #[test]
    fn test_large_decimal_exponents_stay_exact() {
        let vals = values("1e99 1e-40");
        let Some(Value::Decimal(big)) = &vals[0] else {
            panic!("Expected decimal, got {:?}", vals[0]);
        };
        assert_eq!(big.as_bigint_and_exponent(), (BigInt::from(1), -99));
        let Some(Value::Decimal(small)) = &vals[1] else {
            panic!("Expected decimal, got {:?}", vals[1]);
        };
        assert_eq!(small.as_bigint_and_exponent(), (BigInt::from(1), 40));
    }

    #[test]
    fn test_out_of_range_exponent_is_an_error() {
        let err = tokenize("1e99999").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidLiteral);
    }
}
