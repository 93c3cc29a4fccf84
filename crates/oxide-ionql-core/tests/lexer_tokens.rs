//! Tests for the token stream seen by the parser.

use oxide_ionql_core::lexer::{Keyword, LexErrorKind, Operator, Span};
use oxide_ionql_core::{tokenize, Error, TokenKind, Value};

fn kinds(sql: &str) -> Vec<TokenKind> {
    tokenize(sql)
        .unwrap_or_else(|e| panic!("Failed to tokenize: {sql}\nError: {e:?}"))
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// ===================================================================
// Whole queries
// ===================================================================

#[test]
fn query_with_merged_join() {
    assert_eq!(
        kinds("SELECT * FROM a LEFT OUTER JOIN b ON a.x = b.x"),
        vec![
            TokenKind::Keyword(Keyword::Select),
            TokenKind::Star,
            TokenKind::Keyword(Keyword::From),
            TokenKind::Identifier,
            TokenKind::Keyword(Keyword::LeftJoin),
            TokenKind::Identifier,
            TokenKind::Keyword(Keyword::On),
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Operator(Operator::Eq),
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn query_with_group_partial() {
    let kinds = kinds("SELECT x FROM t GROUP PARTIAL BY x");
    assert_eq!(kinds[4], TokenKind::Keyword(Keyword::GroupPartial));
    assert_eq!(kinds[5], TokenKind::By);
}

#[test]
fn negated_operators_merge() {
    let kinds = kinds("a NOT LIKE b AND c NOT BETWEEN d AND e");
    assert_eq!(kinds[1], TokenKind::Operator(Operator::NotLike));
    assert_eq!(kinds[5], TokenKind::Operator(Operator::NotBetween));
}

#[test]
fn lone_not_stays_unary() {
    assert_eq!(
        kinds("NOT a"),
        vec![
            TokenKind::Operator(Operator::Not),
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

// ===================================================================
// Values and positions
// ===================================================================

#[test]
fn literal_values() {
    let tokens = tokenize("'x' 7 true `(a b)`").unwrap();
    assert_eq!(tokens[0].value, Some(Value::string("x")));
    assert_eq!(tokens[1].value, Some(Value::int(7)));
    assert_eq!(tokens[2].value, Some(Value::Bool(true)));
    assert_eq!(
        tokens[3].value,
        Some(Value::Sexp(vec![Value::symbol("a"), Value::symbol("b")]))
    );
}

#[test]
fn decimal_literals_are_exact() {
    let tokens = tokenize("1e30 1e-40 123456789012345678901234567890.1234567890").unwrap();
    let written: Vec<String> = tokens[..3]
        .iter()
        .map(|t| t.value.as_ref().map(Value::to_string).unwrap_or_default())
        .collect();
    assert_eq!(
        written,
        ["1d30", "1d-40", "123456789012345678901234567890.1234567890"]
    );
    assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Literal));
}

#[test]
fn keyword_text_is_lowercased() {
    let tokens = tokenize("SELECT Foo").unwrap();
    assert_eq!(tokens[0].text(), Some("select"));
    assert_eq!(tokens[1].text(), Some("Foo"));
    assert_eq!(tokens[1].key().as_deref(), Some("foo"));
}

#[test]
fn eof_sits_after_last_token() {
    let tokens = tokenize("ab\n  cd").unwrap();
    assert_eq!(tokens[1].span, Span::new(2, 3, 2));
    let eof = tokens.last().unwrap();
    assert!(eof.is_eof());
    assert_eq!((eof.span.line, eof.span.column), (2, 5));
}

#[test]
fn empty_input_is_only_eof() {
    assert_eq!(kinds("   "), vec![TokenKind::Eof]);
}

// ===================================================================
// Errors
// ===================================================================

#[test]
fn error_surfaces_through_parse() {
    match oxide_ionql_core::parse_statement("SELECT a FROM t WHERE a ! 1") {
        Err(Error::Lex(e)) => {
            assert_eq!(e.kind, LexErrorKind::InvalidOperator);
            assert_eq!((e.line, e.column), (1, 25));
        }
        other => panic!("Expected lexer error, got {other:?}"),
    }
}

#[test]
fn error_unterminated_string() {
    let err = tokenize("SELECT 'abc").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::InvalidLiteral);
    assert_eq!(err.column, 8);
}
