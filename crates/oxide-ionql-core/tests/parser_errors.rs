//! Tests for parser error cases.

mod common;
use common::*;

use oxide_ionql_core::lexer::TokenKind;
use oxide_ionql_core::parser::ErrorCode;
use oxide_ionql_core::{Error, ParseOptions, Parser};

// ===================================================================
// Incomplete input
// ===================================================================

#[test]
fn error_empty_input() {
    assert_eq!(error_code(""), ErrorCode::UnexpectedEndOfInput);
}

#[test]
fn error_incomplete_select() {
    assert_eq!(error_code("SELECT"), ErrorCode::UnexpectedEndOfInput);
}

#[test]
fn error_missing_from_source() {
    assert_eq!(error_code("SELECT * FROM"), ErrorCode::UnexpectedEndOfInput);
}

#[test]
fn error_unclosed_paren() {
    let err = parse_error("(1 + 2");
    assert_eq!(err.code, ErrorCode::UnexpectedEndOfInput);
    assert_eq!(err.found, Some(TokenKind::Eof));
    assert_eq!(err.expected.as_deref(), Some("')'"));
}

#[test]
fn error_case_without_end() {
    assert_eq!(error_code("CASE WHEN a THEN 1"), ErrorCode::UnexpectedEndOfInput);
}

// ===================================================================
// Unexpected tokens
// ===================================================================

#[test]
fn error_keyword_where_expression_expected() {
    let err = parse_error("SELECT FROM t");
    assert_eq!(err.code, ErrorCode::UnexpectedKeyword);
    assert_eq!((err.span.line, err.span.column), (1, 8));
}

#[test]
fn error_trailing_tokens() {
    assert_eq!(error_code("a b c"), ErrorCode::UnexpectedToken);
}

#[test]
fn error_star_not_alone() {
    assert_eq!(error_code("SELECT *, a FROM t"), ErrorCode::UnexpectedToken);
}

#[test]
fn error_star_outside_count() {
    assert_eq!(error_code("SELECT SUM(*) FROM t"), ErrorCode::UnexpectedToken);
}

#[test]
fn error_case_requires_when() {
    assert_eq!(error_code("CASE x ELSE 1 END"), ErrorCode::UnexpectedKeyword);
}

#[test]
fn error_extract_requires_date_part() {
    assert_eq!(error_code("EXTRACT(fortnight FROM d)"), ErrorCode::UnexpectedToken);
}

#[test]
fn error_unknown_type() {
    assert_eq!(error_code("CAST(x AS widget)"), ErrorCode::UnexpectedToken);
}

// ===================================================================
// Structural errors
// ===================================================================

#[test]
fn error_missing_from_clause() {
    let err = parse_error("SELECT a WHERE b");
    assert_eq!(err.code, ErrorCode::MissingClause);
    assert_eq!(err.message, "SELECT requires a FROM clause");
    assert_eq!(err.span.column, 10);

    let err = parse_error("PIVOT v AT k");
    assert_eq!(err.code, ErrorCode::MissingClause);
}

#[test]
fn error_outer_join_without_on() {
    assert_eq!(error_code("SELECT * FROM a LEFT JOIN b"), ErrorCode::MalformedJoin);
    assert_eq!(
        error_code("SELECT * FROM a FULL OUTER JOIN b WHERE x"),
        ErrorCode::MalformedJoin
    );
}

#[test]
fn error_cross_join_with_on() {
    assert_eq!(
        error_code("SELECT * FROM a CROSS JOIN b ON true"),
        ErrorCode::MalformedJoin
    );
}

#[test]
fn error_bad_path_component() {
    assert_eq!(error_code("a.'x'"), ErrorCode::InvalidPathComponent);
    assert_eq!(
        error_code("SELECT a.*.b FROM t"),
        ErrorCode::InvalidPathComponent
    );
    assert_eq!(
        error_code("SELECT a[*].* FROM t"),
        ErrorCode::InvalidPathComponent
    );
}

#[test]
fn error_aggregate_arity() {
    assert_eq!(error_code("SUM(a, b)"), ErrorCode::ArityMismatch);
    assert_eq!(error_code("count()"), ErrorCode::ArityMismatch);
}

#[test]
fn error_type_arguments() {
    assert_eq!(error_code("CAST(x AS INT(3))"), ErrorCode::ArityMismatch);
    assert_eq!(error_code("CAST(x AS DECIMAL(1, 2, 3))"), ErrorCode::ArityMismatch);
    assert_eq!(
        error_code("CAST(x AS VARCHAR('a'))"),
        ErrorCode::InvalidTypeParameter
    );
    assert_eq!(
        error_code("CAST(x AS VARCHAR(-1))"),
        ErrorCode::InvalidTypeParameter
    );
}

// ===================================================================
// Nesting bound
// ===================================================================

#[test]
fn error_nesting_too_deep() {
    let sql = format!("{}1{}", "(".repeat(300), ")".repeat(300));
    assert_eq!(error_code(&sql), ErrorCode::NestingTooDeep);
}

#[test]
fn nesting_within_custom_limit() {
    let sql = format!("{}1{}", "[".repeat(20), "]".repeat(20));
    let options = ParseOptions { max_depth: 25 };
    assert!(Parser::with_options(&sql, options).parse_statement().is_ok());

    let options = ParseOptions { max_depth: 10 };
    match Parser::with_options(&sql, options).parse_statement() {
        Err(Error::Parse(e)) => assert_eq!(e.code, ErrorCode::NestingTooDeep),
        other => panic!("Expected nesting error, got {other:?}"),
    }
}

#[test]
fn error_from_source_nesting_too_deep() {
    let sql = format!("SELECT * FROM {}a{}", "(".repeat(10_000), ")".repeat(10_000));
    assert_eq!(error_code(&sql), ErrorCode::NestingTooDeep);

    let sql = format!("SELECT * FROM {}a, b{}", "(".repeat(300), ")".repeat(300));
    assert_eq!(error_code(&sql), ErrorCode::NestingTooDeep);

    let sql = format!("SELECT * FROM {}a JOIN b ON true{}", "(".repeat(5), ")".repeat(5));
    let _ = parse(&sql);
}

#[test]
fn long_operator_chain_counts_toward_depth() {
    let sql = vec!["a"; 300].join(" + ");
    assert_eq!(error_code(&sql), ErrorCode::NestingTooDeep);
    let sql = vec!["a"; 50].join(" + ");
    let _ = parse(&sql);
}

// ===================================================================
// Errors are not internal
// ===================================================================

#[test]
fn user_errors_are_never_internal() {
    for sql in ["", "SELECT", "a +", "SELECT a FROM t LEFT JOIN u", "CAST(x AS y)"] {
        assert!(!parse_err(sql).is_internal(), "{sql}");
    }
}
